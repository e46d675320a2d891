// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chaddi bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Chaddi configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChaddiConfig {
    /// Bot identity, admins and rate limiting.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Balances, command costs, gambling and daan.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Roll game settings.
    #[serde(default)]
    pub roll: RollConfig,

    /// Reminder settings.
    #[serde(default)]
    pub reminder: ReminderConfig,
}

/// Bot identity and admission settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// The bot's own @username, without the `@`.
    ///
    /// Used to strip `/cmd@username` suffixes and to keep the bot out of
    /// roll victim draws.
    #[serde(default)]
    pub username: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Telegram user ids allowed to force-start and reset rolls.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Minimum gap between two commands from the same account.
    #[serde(default = "default_command_cooldown_ms")]
    pub command_cooldown_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            username: None,
            log_level: default_log_level(),
            admin_ids: Vec::new(),
            command_cooldown_ms: default_command_cooldown_ms(),
        }
    }
}

fn default_bot_name() -> String {
    "chaddi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_command_cooldown_ms() -> u64 {
    1000
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required for `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Timeout applied to every outbound Bot API request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chaddi").join("chaddi.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chaddi.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Economy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EconomyConfig {
    /// Balance of a freshly created account.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,

    /// Minimum gap between two gambles of the same account.
    #[serde(default = "default_gamble_cooldown_secs")]
    pub gamble_cooldown_secs: u64,

    /// Balance below which gambling is refused.
    #[serde(default = "default_gamble_min_balance")]
    pub gamble_min_balance: f64,

    /// When a daan amount is NaN or infinite, zero the sender's balance
    /// instead of just rejecting the transfer.
    #[serde(default = "default_zero_sender")]
    pub zero_sender_on_non_finite_daan: bool,

    /// Sticker sent when someone tries to daan to themselves.
    #[serde(default = "default_self_daan_sticker")]
    pub self_daan_sticker: String,

    /// Cost of each paid command, keyed by command name without `/`.
    #[serde(default = "default_command_costs")]
    pub command_costs: BTreeMap<String, f64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            gamble_cooldown_secs: default_gamble_cooldown_secs(),
            gamble_min_balance: default_gamble_min_balance(),
            zero_sender_on_non_finite_daan: default_zero_sender(),
            self_daan_sticker: default_self_daan_sticker(),
            command_costs: default_command_costs(),
        }
    }
}

impl EconomyConfig {
    /// Cost of `command`, if it is a paid command.
    pub fn cost_of(&self, command: &str) -> Option<f64> {
        self.command_costs.get(command).copied()
    }
}

fn default_starting_balance() -> f64 {
    500.0
}

fn default_gamble_cooldown_secs() -> u64 {
    60
}

fn default_gamble_min_balance() -> f64 {
    50.0
}

fn default_zero_sender() -> bool {
    true
}

fn default_self_daan_sticker() -> String {
    "CAADAwADrQADnozgCI_qxocBgD_OFgQ".to_string()
}

fn default_command_costs() -> BTreeMap<String, f64> {
    BTreeMap::from([("sutta".to_string(), 200.0)])
}

/// Roll game configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RollConfig {
    /// Minimum gap between two dice rolls of the same account.
    #[serde(default = "default_roll_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How long a won roll's effect stays applied.
    #[serde(default = "default_effect_duration_secs")]
    pub effect_duration_secs: u64,

    /// Lower bound of the prize credited to the winner.
    #[serde(default = "default_prize_min")]
    pub prize_min: f64,

    /// Upper bound of the prize credited to the winner.
    #[serde(default = "default_prize_max")]
    pub prize_max: f64,

    /// Start a roll in every group at the configured daily times.
    #[serde(default = "default_daily_enabled")]
    pub daily_enabled: bool,

    /// Local `HH:MM` times for the daily roll.
    #[serde(default = "default_daily_times")]
    pub daily_times: Vec<String>,

    /// Offset of the local timezone from UTC, in minutes (IST is 330).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_roll_cooldown_secs(),
            effect_duration_secs: default_effect_duration_secs(),
            prize_min: default_prize_min(),
            prize_max: default_prize_max(),
            daily_enabled: default_daily_enabled(),
            daily_times: default_daily_times(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

fn default_roll_cooldown_secs() -> u64 {
    300
}

fn default_effect_duration_secs() -> u64 {
    3600
}

fn default_prize_min() -> f64 {
    500.0
}

fn default_prize_max() -> f64 {
    800.0
}

fn default_daily_enabled() -> bool {
    true
}

fn default_daily_times() -> Vec<String> {
    vec!["11:00".to_string(), "21:00".to_string()]
}

fn default_utc_offset_minutes() -> i32 {
    330
}

/// Reminder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderConfig {
    /// Active reminders an account may hold before new ones are refused.
    #[serde(default = "default_max_active_per_account")]
    pub max_active_per_account: usize,

    /// Longest accepted reminder delay.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Sticker sent when the requested delay is too large.
    #[serde(default = "default_too_large_sticker")]
    pub too_large_sticker: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            max_active_per_account: default_max_active_per_account(),
            max_duration_secs: default_max_duration_secs(),
            too_large_sticker: default_too_large_sticker(),
        }
    }
}

fn default_max_active_per_account() -> usize {
    10
}

fn default_max_duration_secs() -> u64 {
    10 * 365 * 86_400
}

fn default_too_large_sticker() -> String {
    "CAADAQADrAEAAp6M4Ahtgp9JaiLJPxYE".to_string()
}
