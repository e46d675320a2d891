// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat platform trait (Telegram in production, a mock in tests).

use async_trait::async_trait;

use crate::error::ChaddiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccountId, ChatEvent, ChatId, MessageId};

/// Bidirectional connection to a chat platform.
///
/// Outbound text is HTML formatted. Every outbound call is expected to be
/// bounded by the adapter's own request timeout.
#[async_trait]
pub trait ChatPlatform: PluginAdapter {
    /// Establishes the connection and starts delivering events.
    async fn connect(&mut self) -> Result<(), ChaddiError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<ChatEvent, ChaddiError>;

    /// Sends an HTML message, optionally as a reply.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError>;

    /// Sends a sticker by platform file id, optionally as a reply.
    async fn send_sticker(
        &self,
        chat_id: ChatId,
        sticker_id: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError>;

    /// Replaces the text of a message the bot sent earlier.
    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChaddiError>;

    /// Deletes a message. Fails with `PermissionDenied` when the bot is not an admin.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
    -> Result<(), ChaddiError>;

    /// Removes a member from a group. Fails with `PermissionDenied` when not allowed.
    async fn kick_member(&self, chat_id: ChatId, account_id: AccountId)
    -> Result<(), ChaddiError>;
}
