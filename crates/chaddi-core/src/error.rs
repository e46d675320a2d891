// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chaddi bot.

use thiserror::Error;

/// The primary error type used across all Chaddi components.
///
/// Component methods return this instead of replying to the chat
/// themselves; the dispatcher maps each kind to a user-facing message.
#[derive(Debug, Error)]
pub enum ChaddiError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat platform errors (network failure, API rejection, bad ids).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The chat platform refused an action because the bot lacks rights.
    #[error("permission denied for {action}: {message}")]
    PermissionDenied { action: String, message: String },

    /// A looked-up entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Bad command syntax or an unparsable argument. The message is shown to the user.
    #[error("{0}")]
    InvalidInput(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Deferred-execution facility errors.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChaddiError {
    /// Shorthand for a [`ChaddiError::NotFound`].
    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`ChaddiError::Storage`] wrapping any error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns `true` for errors caused by the user rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound { .. })
    }
}
