// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command handlers. Each one parses its arguments, calls into a component
//! and returns the [`Reply`] to send.

pub mod daan;
pub mod gamble;
pub mod remind;
pub mod rokda;
pub mod roll;
pub mod sutta;
pub mod toggle;

use chaddi_core::{ChaddiError, ChatEvent, Sender};

use crate::command::{BotCommand, Command};
use crate::context::BotContext;

/// What a handler wants sent back, as a reply to the command message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// HTML text.
    Text(String),
    /// A sticker by platform file id.
    Sticker(String),
    /// The handler already talked to the chat itself, or has nothing to say.
    Nothing,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// Run the handler for `command`.
pub async fn run(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    match command.command {
        BotCommand::Rokda => rokda::handle(ctx, event, sender).await,
        BotCommand::Daan => daan::handle(ctx, event, sender, command).await,
        BotCommand::Gamble => gamble::handle(ctx, event, sender).await,
        BotCommand::Roll => roll::handle(ctx, event, sender, command).await,
        BotCommand::Remind => remind::handle(ctx, event, sender, command).await,
        BotCommand::Sutta => sutta::handle(ctx, event, sender).await,
        BotCommand::Toggle => toggle::handle(ctx, event, sender, command).await,
    }
}
