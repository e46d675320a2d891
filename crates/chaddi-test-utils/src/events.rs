// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for inbound [`ChatEvent`]s.

use std::sync::atomic::{AtomicI32, Ordering};

use chaddi_core::{
    AccountId, ChatEvent, ChatId, ChatInfo, ChatKind, EventPayload, MessageId, ReplyTarget, Sender,
};
use chrono::Utc;

static NEXT_MESSAGE_ID: AtomicI32 = AtomicI32::new(1);

/// A non-bot user named `user{id}` with username `user{id}`.
pub fn user(id: i64) -> Sender {
    Sender {
        id: AccountId(id),
        username: Some(format!("user{id}")),
        first_name: format!("user{id}"),
        last_name: None,
        is_bot: false,
    }
}

/// An event with the given chat, sender and payload.
pub fn event(chat: ChatInfo, sender: Option<Sender>, payload: EventPayload) -> ChatEvent {
    ChatEvent {
        message_id: MessageId(NEXT_MESSAGE_ID.fetch_add(1, Ordering::SeqCst)),
        chat,
        sender,
        reply_to: None,
        mentions: Vec::new(),
        payload,
        received_at: Utc::now(),
    }
}

/// A group chat with a fixed title.
pub fn group_chat(chat_id: i64) -> ChatInfo {
    ChatInfo {
        id: ChatId(chat_id),
        title: Some("Chaddi HQ".into()),
        kind: ChatKind::Group,
    }
}

/// A private chat with `account_id`.
pub fn private_chat(account_id: i64) -> ChatInfo {
    ChatInfo {
        id: ChatId(account_id),
        title: None,
        kind: ChatKind::Private,
    }
}

/// A text message from `user(from)` in group `chat_id`.
pub fn group_text(chat_id: i64, from: i64, text: &str) -> ChatEvent {
    event(
        group_chat(chat_id),
        Some(user(from)),
        EventPayload::Text(text.to_string()),
    )
}

/// A text message from `user(from)` in their private chat.
pub fn private_text(from: i64, text: &str) -> ChatEvent {
    event(
        private_chat(from),
        Some(user(from)),
        EventPayload::Text(text.to_string()),
    )
}

/// A die thrown by `user(from)` in group `chat_id`.
pub fn dice(chat_id: i64, from: i64, value: u8) -> ChatEvent {
    event(group_chat(chat_id), Some(user(from)), EventPayload::Dice { value })
}

/// Users joining group `chat_id`.
pub fn joined(chat_id: i64, ids: &[i64]) -> ChatEvent {
    let members = ids.iter().map(|id| user(*id)).collect();
    event(
        group_chat(chat_id),
        ids.first().map(|id| user(*id)),
        EventPayload::MembersJoined(members),
    )
}

/// A user leaving group `chat_id`.
pub fn left(chat_id: i64, id: i64) -> ChatEvent {
    event(
        group_chat(chat_id),
        Some(user(id)),
        EventPayload::MemberLeft(user(id)),
    )
}

/// Turn `event` into a reply to a message sent by `user(to)`.
pub fn replying_to(mut event: ChatEvent, to: i64, message_id: i32) -> ChatEvent {
    event.reply_to = Some(ReplyTarget {
        message_id: MessageId(message_id),
        sender: Some(user(to)),
    });
    event
}

/// Attach a username-less mention of `user(id)` to `event`.
pub fn mentioning(mut event: ChatEvent, id: i64) -> ChatEvent {
    let mut mentioned = user(id);
    mentioned.username = None;
    event.mentions.push(mentioned);
    event
}
