// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group and membership operations.

use std::str::FromStr;

use chaddi_core::{Account, AccountId, ChaddiError, ChatId, ChatKind, Group, GroupMetadata};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, get_json, get_ts, map_tr_err, to_json, ts};
use crate::queries::accounts::account_from_row;

fn group_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    let kind: String = row.get(2)?;
    Ok(Group {
        id: ChatId(row.get(0)?),
        name: row.get(1)?,
        kind: ChatKind::from_str(&kind).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        metadata: get_json(row, 3)?,
        created_at: get_ts(row, 4)?,
        updated_at: get_ts(row, 5)?,
    })
}

fn select_group(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, name, kind, metadata, created_at, updated_at FROM groups WHERE id = ?1",
        params![id],
        group_from_row,
    )
    .optional()
}

/// Insert the group if unseen, otherwise refresh its name and kind.
pub async fn upsert_group(
    db: &Database,
    id: ChatId,
    name: Option<String>,
    kind: ChatKind,
    now: DateTime<Utc>,
) -> Result<Group, ChaddiError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO groups (id, name, kind, metadata, created_at, updated_at)
                 VALUES (?1, ?2, ?3, '{}', ?4, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = COALESCE(excluded.name, groups.name),
                    kind = excluded.kind,
                    updated_at = excluded.updated_at",
                params![id.0, name, kind.to_string(), ts(&now)],
            )?;
            select_group(conn, id.0)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a group by id.
pub async fn get_group(db: &Database, id: ChatId) -> Result<Option<Group>, ChaddiError> {
    db.connection()
        .call(move |conn| select_group(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// All group and supergroup chats, oldest first.
pub async fn list_group_chats(db: &Database) -> Result<Vec<Group>, ChaddiError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, kind, metadata, created_at, updated_at FROM groups
                 WHERE kind IN ('group', 'supergroup') ORDER BY created_at",
            )?;
            let rows = stmt.query_map([], group_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically read, modify and write a group's metadata.
pub async fn update_group_metadata<F, R>(
    db: &Database,
    id: ChatId,
    f: F,
) -> Result<Option<R>, ChaddiError>
where
    F: FnOnce(&mut GroupMetadata) -> R + Send + 'static,
    R: Send + 'static,
{
    db.connection()
        .call(move |conn| {
            let Some(mut group) = select_group(conn, id.0)? else {
                return Ok(None);
            };
            let out = f(&mut group.metadata);
            conn.execute(
                "UPDATE groups SET metadata = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.0, to_json(&group.metadata)?, ts(&Utc::now())],
            )?;
            Ok(Some(out))
        })
        .await
        .map_err(map_tr_err)
}

/// Add an account to a group. Returns `false` if it was already a member.
pub async fn add_member(
    db: &Database,
    group_id: ChatId,
    account_id: AccountId,
    now: DateTime<Utc>,
) -> Result<bool, ChaddiError> {
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO group_members (group_id, account_id, joined_at)
                 VALUES (?1, ?2, ?3)",
                params![group_id.0, account_id.0, ts(&now)],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove an account from a group. Returns `false` if it was not a member.
pub async fn remove_member(
    db: &Database,
    group_id: ChatId,
    account_id: AccountId,
) -> Result<bool, ChaddiError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND account_id = ?2",
                params![group_id.0, account_id.0],
            )?;
            Ok(removed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Accounts currently in a group, in join order.
pub async fn list_members(db: &Database, group_id: ChatId) -> Result<Vec<Account>, ChaddiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.username, a.display_name, a.balance, a.metadata, a.last_seen,
                        a.created_at, a.updated_at
                 FROM group_members m JOIN accounts a ON a.id = m.account_id
                 WHERE m.group_id = ?1
                 ORDER BY m.joined_at, a.id",
            )?;
            let rows = stmt.query_map(params![group_id.0], account_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
