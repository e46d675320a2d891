// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chaddi bot.
//!
//! This crate provides the error type, the domain entities, typed metadata,
//! and the [`ChatPlatform`] trait that the rest of the workspace builds on.

pub mod error;
pub mod metadata;
pub mod models;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChaddiError;
pub use metadata::{AccountMetadata, EffectKind, GroupMetadata, Modifier};
pub use models::{Account, Group, JobContext, Roll, RollRule, RollState, ScheduledJob, roll_state};
pub use traits::{ChatPlatform, PluginAdapter};
pub use types::{
    AccountId, ChatEvent, ChatId, ChatInfo, ChatKind, EventPayload, HealthStatus, MessageId,
    ReplyTarget, Sender,
};
