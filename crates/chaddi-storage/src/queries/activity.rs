// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message and command usage logs.

use chaddi_core::ChaddiError;
use rusqlite::params;

use crate::database::{Database, map_tr_err, ts};
use crate::models::{CommandUsage, MessageRecord};

/// Log an observed message. Re-delivered messages are ignored.
pub async fn record_message(db: &Database, record: &MessageRecord) -> Result<(), ChaddiError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO messages (chat_id, message_id, from_id, text, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.chat_id.0,
                    record.message_id.0,
                    record.from_id.map(|a| a.0),
                    record.text,
                    ts(&record.sent_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Log one command invocation.
pub async fn record_command_usage(db: &Database, usage: &CommandUsage) -> Result<(), ChaddiError> {
    let usage = usage.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO command_usage (command, account_id, chat_id, used_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    usage.command,
                    usage.account_id.map(|a| a.0),
                    usage.chat_id.0,
                    ts(&usage.used_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// How many times a command has been used.
pub async fn count_command_usage(db: &Database, command: &str) -> Result<i64, ChaddiError> {
    let command = command.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM command_usage WHERE command = ?1",
                params![command],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
