// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deferred execution for the Chaddi bot.
//!
//! [`JobQueue`] runs named in-memory jobs (one-shot, repeating, daily) with
//! cancellation by name. [`ReminderService`] builds durable `/remind`
//! reminders on top of it.

pub mod duration;
pub mod queue;
pub mod reminder;

pub use duration::{extract_reminder_message, parse_reminder_due};
pub use queue::{JobControl, JobInfo, JobKind, JobQueue, next_daily_delay};
pub use reminder::{
    REMINDER_USAGE, RecoveryReport, ReminderOutcome, ReminderRequest, ReminderService,
    reminder_job_name,
};
