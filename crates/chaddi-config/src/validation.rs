// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, ordered prize bounds, and well-formed daily times.

use chrono::NaiveTime;

use crate::diagnostic::ConfigError;
use crate::model::ChaddiConfig;

/// Largest accepted UTC offset, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Parses a `HH:MM` daily time.
pub fn parse_daily_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChaddiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.telegram.request_timeout_secs == 0 {
        fail("telegram.request_timeout_secs must be greater than zero".to_string());
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    let economy = &config.economy;
    if !economy.starting_balance.is_finite() || economy.starting_balance < 0.0 {
        fail(format!(
            "economy.starting_balance must be non-negative, got {}",
            economy.starting_balance
        ));
    }
    if !economy.gamble_min_balance.is_finite() || economy.gamble_min_balance < 0.0 {
        fail(format!(
            "economy.gamble_min_balance must be non-negative, got {}",
            economy.gamble_min_balance
        ));
    }
    for (command, cost) in &economy.command_costs {
        if !cost.is_finite() || *cost < 0.0 {
            fail(format!(
                "economy.command_costs.{command} must be non-negative, got {cost}"
            ));
        }
    }

    let roll = &config.roll;
    if roll.prize_min < 0.0 {
        fail(format!(
            "roll.prize_min must be non-negative, got {}",
            roll.prize_min
        ));
    }
    if roll.prize_min > roll.prize_max {
        fail(format!(
            "roll.prize_min ({}) must not exceed roll.prize_max ({})",
            roll.prize_min, roll.prize_max
        ));
    }
    if roll.effect_duration_secs == 0 {
        fail("roll.effect_duration_secs must be greater than zero".to_string());
    }
    for time in &roll.daily_times {
        if parse_daily_time(time).is_none() {
            fail(format!("roll.daily_times entry `{time}` is not a valid HH:MM time"));
        }
    }
    if roll.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        fail(format!(
            "roll.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
            roll.utc_offset_minutes
        ));
    }

    if config.reminder.max_duration_secs == 0 {
        fail("reminder.max_duration_secs must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
