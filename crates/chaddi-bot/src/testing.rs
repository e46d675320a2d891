// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixture for the unit tests in this crate.

use std::sync::Arc;

use chaddi_config::model::ChaddiConfig;
use chaddi_core::{AccountId, ChatEvent, Sender};
use chaddi_economy::Activity;
use chaddi_storage::Database;
use chaddi_storage::queries::accounts;
use chaddi_test_utils::MockPlatform;
use tempfile::TempDir;

use crate::command::parse_command;
use crate::context::BotContext;

pub const GROUP: i64 = -100;
pub const ADMIN: i64 = 42;

pub struct Fixture {
    pub ctx: Arc<BotContext>,
    pub platform: Arc<MockPlatform>,
    _dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ChaddiConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("bot.db").to_str().unwrap())
            .await
            .unwrap();
        let platform = Arc::new(MockPlatform::new());
        let ctx = Arc::new(BotContext::new(config, db, platform.clone()));
        Self {
            ctx,
            platform,
            _dir: dir,
        }
    }

    /// Feed `event` through the ledger so its sender exists and is a member.
    pub async fn observe(&self, event: &ChatEvent) {
        let activity = match event.text().and_then(|t| parse_command(t, self.ctx.bot_username())) {
            Some(_) => Activity::Command,
            None => Activity::Chat,
        };
        self.ctx.ledger.observe(event, activity).await.unwrap();
    }

    pub async fn set_balance(&self, id: i64, balance: f64) {
        accounts::update_account(&self.ctx.db, AccountId(id), move |a| a.balance = balance)
            .await
            .unwrap()
            .unwrap();
    }

    pub async fn balance(&self, id: i64) -> f64 {
        accounts::get_account(&self.ctx.db, AccountId(id))
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}

/// Defaults with no rate limit, one admin and a known bot username.
pub fn test_config() -> ChaddiConfig {
    let mut config = ChaddiConfig::default();
    config.bot.username = Some("chaddi_bot".into());
    config.bot.admin_ids = vec![ADMIN];
    config.bot.command_cooldown_ms = 0;
    config.storage.wal_mode = false;
    config
}

pub fn sender_of(event: &ChatEvent) -> Sender {
    event.sender.clone().unwrap()
}
