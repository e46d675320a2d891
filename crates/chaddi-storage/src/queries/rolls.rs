// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Roll operations. One row per group, keyed by `group_id`.

use std::str::FromStr;

use chaddi_core::{AccountId, ChaddiError, ChatId, Roll, RollRule};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, get_ts, map_tr_err, ts};

const ROLL_COLUMNS: &str = "id, group_id, rule, goal, victim_id, winner_id, prize, expiry, \
                            effect_active, created_at, updated_at";

fn roll_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Roll> {
    let rule: String = row.get(2)?;
    Ok(Roll {
        id: row.get(0)?,
        group_id: ChatId(row.get(1)?),
        rule: RollRule::from_str(&rule).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        goal: row.get(3)?,
        victim_id: AccountId(row.get(4)?),
        winner_id: row.get::<_, Option<i64>>(5)?.map(AccountId),
        prize: row.get(6)?,
        expiry: get_ts(row, 7)?,
        effect_active: row.get(8)?,
        created_at: get_ts(row, 9)?,
        updated_at: get_ts(row, 10)?,
    })
}

fn select_roll(conn: &rusqlite::Connection, group_id: i64) -> rusqlite::Result<Option<Roll>> {
    conn.query_row(
        &format!("SELECT {ROLL_COLUMNS} FROM rolls WHERE group_id = ?1"),
        params![group_id],
        roll_from_row,
    )
    .optional()
}

/// Get the roll of a group, whatever its state.
pub async fn get_roll(db: &Database, group_id: ChatId) -> Result<Option<Roll>, ChaddiError> {
    db.connection()
        .call(move |conn| select_roll(conn, group_id.0))
        .await
        .map_err(map_tr_err)
}

/// Replace the group's roll with `roll`.
pub async fn upsert_roll(db: &Database, roll: &Roll) -> Result<(), ChaddiError> {
    let roll = roll.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rolls (group_id, id, rule, goal, victim_id, winner_id, prize, expiry,
                                    effect_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(group_id) DO UPDATE SET
                    id = excluded.id, rule = excluded.rule, goal = excluded.goal,
                    victim_id = excluded.victim_id, winner_id = excluded.winner_id,
                    prize = excluded.prize, expiry = excluded.expiry,
                    effect_active = excluded.effect_active,
                    created_at = excluded.created_at, updated_at = excluded.updated_at",
                params![
                    roll.group_id.0,
                    roll.id,
                    roll.rule.to_string(),
                    roll.goal,
                    roll.victim_id.0,
                    roll.winner_id.map(|w| w.0),
                    roll.prize,
                    ts(&roll.expiry),
                    roll.effect_active,
                    ts(&roll.created_at),
                    ts(&roll.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record `winner` on the group's roll if it is still open at `now`.
///
/// Conditional single-row UPDATE, so at most one winner is ever recorded.
/// Returns the updated roll, or `None` if someone else got there first or
/// the roll is no longer open.
pub async fn claim_win(
    db: &Database,
    group_id: ChatId,
    winner: AccountId,
    new_expiry: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Option<Roll>, ChaddiError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE rolls SET winner_id = ?2, expiry = ?3, updated_at = ?4
                 WHERE group_id = ?1 AND winner_id IS NULL AND expiry > ?4",
                params![group_id.0, winner.0, ts(&new_expiry), ts(&now)],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_roll(conn, group_id.0)
        })
        .await
        .map_err(map_tr_err)
}

/// Marks whether a rollback is pending for the group's roll.
pub async fn set_effect_active(
    db: &Database,
    group_id: ChatId,
    active: bool,
) -> Result<(), ChaddiError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE rolls SET effect_active = ?2, updated_at = ?3 WHERE group_id = ?1",
                params![group_id.0, active, ts(&Utc::now())],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Retire the group's roll: clamp its expiry to `now` and clear the pending
/// rollback flag. Returns the roll as it was before retiring.
pub async fn retire_roll(
    db: &Database,
    group_id: ChatId,
    now: DateTime<Utc>,
) -> Result<Option<Roll>, ChaddiError> {
    db.connection()
        .call(move |conn| {
            let before = select_roll(conn, group_id.0)?;
            if before.is_some() {
                let now = ts(&now);
                conn.execute(
                    "UPDATE rolls SET
                        expiry = CASE WHEN expiry > ?2 THEN ?2 ELSE expiry END,
                        effect_active = 0,
                        updated_at = ?2
                     WHERE group_id = ?1",
                    params![group_id.0, now],
                )?;
            }
            Ok(before)
        })
        .await
        .map_err(map_tr_err)
}

/// Rolls whose effect is still applied, for rollback recovery.
pub async fn list_active_effects(db: &Database) -> Result<Vec<Roll>, ChaddiError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROLL_COLUMNS} FROM rolls
                 WHERE winner_id IS NOT NULL AND effect_active = 1
                 ORDER BY expiry"
            ))?;
            let rows = stmt.query_map([], roll_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
