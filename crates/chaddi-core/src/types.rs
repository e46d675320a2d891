// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers and platform-neutral chat event types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable external id of a chat participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External id of a chat (private, group, or supergroup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a message within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Kind of chat an event originated from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Group and supergroup chats take part in the roll game and membership tracking.
    pub fn is_group(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Identity of the user behind an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: AccountId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

impl Sender {
    /// First and last name joined, falling back to the username.
    pub fn display_name(&self) -> String {
        let full = match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        };
        if full.trim().is_empty() {
            self.username.clone().unwrap_or_else(|| self.id.to_string())
        } else {
            full
        }
    }
}

/// The chat an event was posted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
    pub kind: ChatKind,
}

/// The message an event replies to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub message_id: MessageId,
    pub sender: Option<Sender>,
}

/// What an inbound event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Plain text or a caption. Commands are text starting with `/`.
    Text(String),
    /// An animated die with its face value.
    Dice { value: u8 },
    /// One or more users joined the chat.
    MembersJoined(Vec<Sender>),
    /// A user left (or was removed from) the chat.
    MemberLeft(Sender),
    /// Anything else (stickers, media without caption, service messages).
    Other,
}

/// An inbound chat event, already converted from the platform's wire type.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub message_id: MessageId,
    pub chat: ChatInfo,
    pub sender: Option<Sender>,
    pub reply_to: Option<ReplyTarget>,
    /// Users mentioned without a username (Telegram `text_mention` entities).
    pub mentions: Vec<Sender>,
    pub payload: EventPayload,
    pub received_at: DateTime<Utc>,
}

impl ChatEvent {
    /// Text content, if the event carries any.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// The chat id when the event comes from a group or supergroup.
    pub fn group_id(&self) -> Option<ChatId> {
        self.chat.kind.is_group().then_some(self.chat.id)
    }
}
