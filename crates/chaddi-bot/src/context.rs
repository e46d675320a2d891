// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicitly constructed shared state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use chaddi_config::model::ChaddiConfig;
use chaddi_core::{AccountId, ChatPlatform, text};
use chaddi_economy::{GambleRules, Ledger, Paywall};
use chaddi_roll::RollGame;
use chaddi_scheduler::{JobQueue, ReminderService};
use chaddi_storage::Database;

use crate::admission::RateLimiter;

/// Everything a handler needs, built once at startup.
pub struct BotContext {
    pub config: ChaddiConfig,
    pub db: Database,
    pub platform: Arc<dyn ChatPlatform>,
    pub queue: JobQueue,
    pub ledger: Ledger,
    pub paywall: Paywall,
    pub roll: RollGame,
    pub reminders: ReminderService,
    pub rate_limiter: RateLimiter,
}

impl BotContext {
    pub fn new(config: ChaddiConfig, db: Database, platform: Arc<dyn ChatPlatform>) -> Self {
        let queue = JobQueue::new();
        let ledger = Ledger::new(db.clone(), config.economy.starting_balance);
        let paywall = Paywall::new(db.clone(), config.economy.command_costs.clone());
        let roll = RollGame::new(
            db.clone(),
            Arc::clone(&platform),
            queue.clone(),
            config.roll.clone(),
            config.bot.username.clone(),
        );
        let reminders = ReminderService::new(
            db.clone(),
            Arc::clone(&platform),
            queue.clone(),
            config.reminder.clone(),
        );
        let rate_limiter =
            RateLimiter::new(Duration::from_millis(config.bot.command_cooldown_ms));

        Self {
            config,
            db,
            platform,
            queue,
            ledger,
            paywall,
            roll,
            reminders,
            rate_limiter,
        }
    }

    /// Whether `account_id` is listed in `bot.admin_ids`.
    pub fn is_admin(&self, account_id: AccountId) -> bool {
        self.config.bot.admin_ids.contains(&account_id.0)
    }

    pub fn bot_username(&self) -> Option<&str> {
        self.config.bot.username.as_deref()
    }

    pub fn gamble_rules(&self) -> GambleRules {
        GambleRules {
            cooldown: text::seconds(self.config.economy.gamble_cooldown_secs),
            min_balance: self.config.economy.gamble_min_balance,
        }
    }
}
