// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the real dispatcher over a [`MockPlatform`] and a
//! temp SQLite database. `send()` drives one event through the full
//! pipeline: ledger sync, enforcement, admission, handler, reply.

use std::sync::Arc;

use chaddi_bot::{BotContext, Dispatcher, StartupReport, handle_event};
use chaddi_config::model::ChaddiConfig;
use chaddi_core::{Account, AccountId, ChaddiError, ChatEvent};
use chaddi_storage::Database;
use chaddi_storage::queries::accounts;
use chrono::Utc;

use crate::mock_platform::MockPlatform;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: ChaddiConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ChaddiConfig::default();
        config.bot.username = Some("chaddi_bot".into());
        config.bot.command_cooldown_ms = 0;
        config.storage.wal_mode = false;
        Self { config }
    }

    /// Accounts allowed to run admin commands.
    pub fn with_admins(mut self, ids: &[i64]) -> Self {
        self.config.bot.admin_ids = ids.to_vec();
        self
    }

    /// Minimum spacing between commands from one account.
    pub fn with_command_cooldown_ms(mut self, ms: u64) -> Self {
        self.config.bot.command_cooldown_ms = ms;
        self
    }

    /// Replace the whole configuration. The database path is still a temp file.
    pub fn with_config(mut self, config: ChaddiConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, ChaddiError> {
        let temp_dir = tempfile::TempDir::new().map_err(ChaddiError::storage)?;
        let db_path = temp_dir.path().join("chaddi.db").to_string_lossy().to_string();
        self.config.storage.database_path = db_path.clone();

        let db = Database::open_with_options(&db_path, self.config.storage.wal_mode).await?;
        let platform = Arc::new(MockPlatform::new());
        let ctx = Arc::new(BotContext::new(self.config, db, platform.clone()));

        Ok(TestHarness {
            platform,
            dispatcher: Dispatcher::new(ctx),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete bot over a mock platform and temp storage.
pub struct TestHarness {
    /// The mock chat platform; inspect it for replies.
    pub platform: Arc<MockPlatform>,
    pub dispatcher: Dispatcher,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, ChaddiError> {
        Self::builder().build().await
    }

    pub fn context(&self) -> &Arc<BotContext> {
        self.dispatcher.context()
    }

    pub fn db(&self) -> &Database {
        &self.context().db
    }

    /// Run startup recovery as the binary does before serving.
    pub async fn start(&self) -> Result<StartupReport, ChaddiError> {
        self.dispatcher.start(Utc::now()).await
    }

    /// Process one event to completion.
    pub async fn send(&self, event: ChatEvent) {
        handle_event(self.context(), event).await;
    }

    pub async fn account(&self, id: i64) -> Option<Account> {
        accounts::get_account(self.db(), AccountId(id))
            .await
            .ok()
            .flatten()
    }

    /// Current balance, or `None` for an unknown account.
    pub async fn balance(&self, id: i64) -> Option<f64> {
        self.account(id).await.map(|a| a.balance)
    }

    pub async fn set_balance(&self, id: i64, balance: f64) -> Result<(), ChaddiError> {
        accounts::update_account(self.db(), AccountId(id), move |a| a.balance = balance)
            .await?
            .ok_or_else(|| ChaddiError::not_found("account", id))?;
        Ok(())
    }

    /// Cancel every scheduled job so test runtimes shut down cleanly.
    pub fn stop_jobs(&self) {
        self.context().queue.shutdown();
    }
}
