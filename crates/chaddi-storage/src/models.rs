// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only log records. The main entities live in `chaddi_core::models`.

use chaddi_core::{AccountId, ChatId, MessageId};
use chrono::{DateTime, Utc};

/// A chat message the bot observed.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub from_id: Option<AccountId>,
    pub text: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// One invocation of a slash command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandUsage {
    pub command: String,
    pub account_id: Option<AccountId>,
    pub chat_id: ChatId,
    pub used_at: DateTime<Utc>,
}
