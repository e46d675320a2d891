// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account operations.
//!
//! Balance and metadata changes go through [`update_account`] or
//! [`update_account_pair`], which read, modify and write inside a single
//! connection call so no other writer can interleave.

use chaddi_core::{Account, AccountId, ChaddiError};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, get_json, get_opt_ts, get_ts, map_tr_err, to_json, ts};

const ACCOUNT_COLUMNS: &str =
    "id, username, display_name, balance, metadata, last_seen, created_at, updated_at";

pub(crate) fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: AccountId(row.get(0)?),
        username: row.get(1)?,
        display_name: row.get(2)?,
        balance: row.get(3)?,
        metadata: get_json(row, 4)?,
        last_seen: get_opt_ts(row, 5)?,
        created_at: get_ts(row, 6)?,
        updated_at: get_ts(row, 7)?,
    })
}

fn select_account(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
        params![id],
        account_from_row,
    )
    .optional()
}

fn write_account(conn: &rusqlite::Connection, account: &Account) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE accounts SET username = ?2, display_name = ?3, balance = ROUND(?4, 2),
                metadata = ?5, last_seen = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            account.id.0,
            account.username,
            account.display_name,
            account.balance,
            to_json(&account.metadata)?,
            account.last_seen.as_ref().map(ts),
            ts(&account.updated_at),
        ],
    )?;
    Ok(())
}

/// Get an account by id.
pub async fn get_account(db: &Database, id: AccountId) -> Result<Option<Account>, ChaddiError> {
    db.connection()
        .call(move |conn| select_account(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// Find an account by username, ignoring case and a leading `@`.
pub async fn find_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<Account>, ChaddiError> {
    let username = username.trim().trim_start_matches('@').to_string();
    if username.is_empty() {
        return Ok(None);
    }
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts
                     WHERE username = ?1 COLLATE NOCASE
                     ORDER BY updated_at DESC LIMIT 1"
                ),
                params![username],
                account_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert the account if it is unseen, otherwise refresh its profile and
/// `last_seen`. Returns the stored account and whether it was created.
pub async fn upsert_profile(
    db: &Database,
    account: Account,
    now: DateTime<Utc>,
) -> Result<(Account, bool), ChaddiError> {
    db.connection()
        .call(move |conn| {
            let created = conn.execute(
                "INSERT OR IGNORE INTO accounts
                    (id, username, display_name, balance, metadata, last_seen, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ROUND(?4, 2), ?5, ?6, ?7, ?7)",
                params![
                    account.id.0,
                    account.username,
                    account.display_name,
                    account.balance,
                    to_json(&account.metadata)?,
                    ts(&now),
                    ts(&account.created_at),
                ],
            )? == 1;
            if !created {
                conn.execute(
                    "UPDATE accounts SET username = ?2, display_name = ?3, last_seen = ?4,
                            updated_at = ?4
                     WHERE id = ?1",
                    params![account.id.0, account.username, account.display_name, ts(&now)],
                )?;
            }
            let stored = select_account(conn, account.id.0)?
                .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            Ok((stored, created))
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically read, modify and write one account.
///
/// Returns `None` when the account does not exist. `f` runs on the database
/// thread; keep it free of I/O.
pub async fn update_account<F, R>(
    db: &Database,
    id: AccountId,
    f: F,
) -> Result<Option<(Account, R)>, ChaddiError>
where
    F: FnOnce(&mut Account) -> R + Send + 'static,
    R: Send + 'static,
{
    db.connection()
        .call(move |conn| {
            let Some(mut account) = select_account(conn, id.0)? else {
                return Ok(None);
            };
            let out = f(&mut account);
            account.updated_at = Utc::now();
            write_account(conn, &account)?;
            Ok(Some((account, out)))
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically read, modify and write two accounts in one transaction.
///
/// Returns `None` if either account is missing. When both ids are equal
/// `f` receives two copies of the same row and the second one is written last.
pub async fn update_account_pair<F, R>(
    db: &Database,
    first: AccountId,
    second: AccountId,
    f: F,
) -> Result<Option<(Account, Account, R)>, ChaddiError>
where
    F: FnOnce(&mut Account, &mut Account) -> R + Send + 'static,
    R: Send + 'static,
{
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let (Some(mut a), Some(mut b)) =
                (select_account(&tx, first.0)?, select_account(&tx, second.0)?)
            else {
                return Ok(None);
            };
            let out = f(&mut a, &mut b);
            let now = Utc::now();
            a.updated_at = now;
            b.updated_at = now;
            write_account(&tx, &a)?;
            write_account(&tx, &b)?;
            tx.commit()?;
            Ok(Some((a, b, out)))
        })
        .await
        .map_err(map_tr_err)
}

/// Debit `cost` only if the balance is strictly greater than it.
///
/// Single conditional UPDATE; returns whether the debit happened.
pub async fn debit_if_above(db: &Database, id: AccountId, cost: f64) -> Result<bool, ChaddiError> {
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE accounts SET balance = ROUND(balance - ?2, 2), updated_at = ?3
                 WHERE id = ?1 AND balance > ?2",
                params![id.0, cost, now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Adds `delta` (may be negative) to the balance. Returns the new balance.
pub async fn add_balance(
    db: &Database,
    id: AccountId,
    delta: f64,
) -> Result<Option<f64>, ChaddiError> {
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "UPDATE accounts SET balance = ROUND(balance + ?2, 2), updated_at = ?3
                 WHERE id = ?1 RETURNING balance",
                params![id.0, delta, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Clears every unfinished sutta. Returns how many accounts were changed.
///
/// Burn timers do not survive a restart, so progress left in metadata would
/// otherwise refuse `/sutta` forever.
pub async fn clear_sutta_progress(db: &Database) -> Result<usize, ChaddiError> {
    db.connection()
        .call(|conn| {
            let tx = conn.transaction()?;
            let stale = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE metadata LIKE '%sutta_ittr%'"
                ))?;
                stmt.query_map([], account_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };
            let now = Utc::now();
            let mut cleared = 0;
            for mut account in stale {
                if account.metadata.sutta_progress().is_none() {
                    continue;
                }
                account.metadata.set_sutta_progress(None);
                account.updated_at = now;
                write_account(&tx, &account)?;
                cleared += 1;
            }
            tx.commit()?;
            Ok(cleared)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaddi_core::EffectKind;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn seed(db: &Database, id: i64, username: &str, balance: f64) -> Account {
        let account = Account::new(
            AccountId(id),
            Some(username.to_string()),
            username.to_uppercase(),
            balance,
            Utc::now(),
        );
        upsert_profile(db, account, Utc::now()).await.unwrap().0
    }

    #[tokio::test]
    async fn upsert_creates_then_refreshes_profile() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();
        let fresh = Account::new(AccountId(1), Some("paul".into()), "Paul".into(), 500.0, now);
        let (stored, created) = upsert_profile(&db, fresh.clone(), now).await.unwrap();
        assert!(created);
        assert_eq!(stored.balance, 500.0);

        let mut renamed = fresh;
        renamed.display_name = "Paul K".into();
        renamed.balance = 9999.0;
        let (stored, created) = upsert_profile(&db, renamed, now).await.unwrap();
        assert!(!created);
        assert_eq!(stored.display_name, "Paul K");
        // Profile refresh never touches the balance.
        assert_eq!(stored.balance, 500.0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_username_is_case_insensitive() {
        let (db, _dir) = setup_db().await;
        seed(&db, 2, "Kwid", 10.0).await;
        let found = find_by_username(&db, "@kwid").await.unwrap().unwrap();
        assert_eq!(found.id, AccountId(2));
        assert!(find_by_username(&db, "ghost").await.unwrap().is_none());
        assert!(find_by_username(&db, "@").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_account_persists_metadata() {
        let (db, _dir) = setup_db().await;
        seed(&db, 3, "victim", 100.0).await;
        let (_, added) = update_account(&db, AccountId(3), |a| {
            a.metadata.add_effect(EffectKind::Muted, -42)
        })
        .await
        .unwrap()
        .unwrap();
        assert!(added);
        let reloaded = get_account(&db, AccountId(3)).await.unwrap().unwrap();
        assert!(reloaded.metadata.has_effect(EffectKind::Muted, -42));

        let missing = update_account(&db, AccountId(404), |_| ()).await.unwrap();
        assert!(missing.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn debit_requires_strictly_greater_balance() {
        let (db, _dir) = setup_db().await;
        seed(&db, 4, "exact", 200.0).await;
        seed(&db, 5, "rich", 201.0).await;

        assert!(!debit_if_above(&db, AccountId(4), 200.0).await.unwrap());
        assert_eq!(get_account(&db, AccountId(4)).await.unwrap().unwrap().balance, 200.0);

        assert!(debit_if_above(&db, AccountId(5), 200.0).await.unwrap());
        assert_eq!(get_account(&db, AccountId(5)).await.unwrap().unwrap().balance, 1.0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pair_update_writes_both_rows() {
        let (db, _dir) = setup_db().await;
        seed(&db, 6, "a", 500.0).await;
        seed(&db, 7, "b", 200.0).await;
        let (a, b, ()) = update_account_pair(&db, AccountId(6), AccountId(7), |a, b| {
            a.balance -= 100.0;
            b.balance += 100.0;
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!((a.balance, b.balance), (400.0, 300.0));
        assert_eq!(get_account(&db, AccountId(7)).await.unwrap().unwrap().balance, 300.0);

        let none = update_account_pair(&db, AccountId(6), AccountId(99), |_, _| ())
            .await
            .unwrap();
        assert!(none.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn add_balance_rounds_and_returns_new_value() {
        let (db, _dir) = setup_db().await;
        seed(&db, 8, "c", 10.0).await;
        let new = add_balance(&db, AccountId(8), 0.333).await.unwrap();
        assert_eq!(new, Some(10.33));
        assert_eq!(add_balance(&db, AccountId(9), 1.0).await.unwrap(), None);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn clear_sutta_progress_only_touches_smokers() {
        let (db, _dir) = setup_db().await;
        seed(&db, 10, "smoker", 10.0).await;
        seed(&db, 11, "clean", 10.0).await;
        update_account(&db, AccountId(10), |a| a.metadata.set_sutta_progress(Some(3)))
            .await
            .unwrap();

        assert_eq!(clear_sutta_progress(&db).await.unwrap(), 1);
        let smoker = get_account(&db, AccountId(10)).await.unwrap().unwrap();
        assert_eq!(smoker.metadata.sutta_progress(), None);
        assert_eq!(clear_sutta_progress(&db).await.unwrap(), 0);
        db.close().await.unwrap();
    }
}
