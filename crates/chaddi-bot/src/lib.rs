// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event dispatcher and command handlers for the Chaddi bot.
//!
//! The [`Dispatcher`] is the central coordinator that:
//! - Receives events from a chat platform
//! - Syncs senders and memberships into the ledger
//! - Enforces roll effects on live messages
//! - Admits, charges and runs commands
//! - Handles graceful shutdown

pub mod admission;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod enforcement;
pub mod errors;
pub mod handlers;
pub mod shutdown;

#[cfg(test)]
mod testing;

pub use command::{BotCommand, Command, parse_command};
pub use context::BotContext;
pub use dispatcher::{Dispatcher, StartupReport, handle_event};
pub use errors::reply_for_error;
pub use shutdown::install_signal_handler;
