// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-group dice roulette.
//!
//! [`RollGame`] runs the roll state machine, applies and rolls back victim
//! effects, recovers pending rollbacks after a restart and starts the
//! daily roll.

pub mod daily;
pub mod describe;
pub mod game;

pub use daily::{DAILY_ROLL_JOB, daily_schedule, schedule_daily};
pub use game::{DiceOutcome, RollGame, StartOutcome, rollback_job_name};
