// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram messages into platform-neutral [`ChatEvent`]s.

use chaddi_core::{
    AccountId, ChatEvent, ChatId, ChatInfo, ChatKind, EventPayload, MessageId, ReplyTarget, Sender,
};
use teloxide::types::{Chat, DiceEmoji, Message, MessageEntityKind, User};

/// Maps a Telegram user to a [`Sender`].
pub fn to_sender(user: &User) -> Sender {
    Sender {
        // Telegram user ids fit in 52 bits.
        id: AccountId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_bot: user.is_bot,
    }
}

pub fn to_chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    };
    ChatInfo {
        id: ChatId(chat.id.0),
        title: chat.title().map(str::to_string),
        kind,
    }
}

fn payload(msg: &Message) -> EventPayload {
    if let Some(text) = msg.text() {
        return EventPayload::Text(text.to_string());
    }
    if let Some(dice) = msg.dice() {
        // Only the classic die plays the roulette.
        if dice.emoji == DiceEmoji::Dice {
            return EventPayload::Dice { value: dice.value };
        }
        return EventPayload::Other;
    }
    if let Some(members) = msg.new_chat_members() {
        return EventPayload::MembersJoined(members.iter().map(to_sender).collect());
    }
    if let Some(member) = msg.left_chat_member() {
        return EventPayload::MemberLeft(to_sender(member));
    }
    EventPayload::Other
}

/// Users mentioned by `text_mention` entities (people without a username).
fn mentions(msg: &Message) -> Vec<Sender> {
    msg.entities()
        .unwrap_or_default()
        .iter()
        .filter_map(|entity| match &entity.kind {
            MessageEntityKind::TextMention { user } => Some(to_sender(user)),
            _ => None,
        })
        .collect()
}

/// Converts a Telegram message into a [`ChatEvent`].
pub fn to_chat_event(msg: &Message) -> ChatEvent {
    ChatEvent {
        message_id: MessageId(msg.id.0),
        chat: to_chat_info(&msg.chat),
        sender: msg.from.as_ref().map(to_sender),
        reply_to: msg.reply_to_message().map(|reply| ReplyTarget {
            message_id: MessageId(reply.id.0),
            sender: reply.from.as_ref().map(to_sender),
        }),
        mentions: mentions(msg),
        payload: payload(msg),
        received_at: msg.date,
    }
}
