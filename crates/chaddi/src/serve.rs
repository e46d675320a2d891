// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chaddi serve` command implementation.
//!
//! Opens storage, connects to Telegram, re-arms persisted reminders and
//! roll rollbacks, then runs the dispatcher until SIGINT or SIGTERM.

use std::sync::Arc;

use chaddi_bot::{BotContext, Dispatcher, install_signal_handler};
use chaddi_config::ChaddiConfig;
use chaddi_core::{ChaddiError, ChatPlatform};
use chaddi_storage::Database;
use chaddi_telegram::TelegramPlatform;
use chrono::Utc;
use tracing::info;

/// Runs the `chaddi serve` command.
pub async fn run_serve(config: ChaddiConfig) -> Result<(), ChaddiError> {
    init_tracing(&config.bot.log_level);

    info!(bot = %config.bot.name, "starting chaddi serve");

    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    info!(path = %config.storage.database_path, "storage ready");

    let mut telegram = TelegramPlatform::new(&config.telegram)?;
    telegram.connect().await?;
    let platform: Arc<dyn ChatPlatform> = Arc::new(telegram);

    let ctx = Arc::new(BotContext::new(config, db, platform));
    let dispatcher = Dispatcher::new(ctx);
    dispatcher.start(Utc::now()).await?;

    let cancel = install_signal_handler();
    dispatcher.run(cancel).await?;
    dispatcher.shutdown().await?;

    info!("chaddi serve stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chaddi={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
