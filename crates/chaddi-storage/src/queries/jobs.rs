// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled job persistence. The context column holds a JSON [`JobContext`].

use chaddi_core::{AccountId, ChaddiError, ChatId, JobContext, ScheduledJob};
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use crate::database::{Database, get_ts, map_tr_err, to_json, ts};

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledJob> {
    let id: String = row.get(0)?;
    let raw: String = row.get(3)?;
    let context = match serde_json::from_str::<JobContext>(&raw) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            warn!(job_id = %id, error = %e, "undecodable job context");
            None
        }
    };
    Ok(ScheduledJob {
        id,
        chat_id: ChatId(row.get(1)?),
        account_id: AccountId(row.get(2)?),
        context,
        created_at: get_ts(row, 4)?,
        updated_at: get_ts(row, 5)?,
    })
}

/// Persist a new job.
pub async fn insert_job(db: &Database, job: &ScheduledJob) -> Result<(), ChaddiError> {
    let job = job.clone();
    db.connection()
        .call(move |conn| {
            let context = match &job.context {
                Some(ctx) => to_json(ctx)?,
                None => "{}".to_string(),
            };
            conn.execute(
                "INSERT INTO scheduled_jobs (id, chat_id, account_id, context, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    job.id,
                    job.chat_id.0,
                    job.account_id.0,
                    context,
                    ts(&job.created_at),
                    ts(&job.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a job by id.
pub async fn get_job(db: &Database, id: &str) -> Result<Option<ScheduledJob>, ChaddiError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, chat_id, account_id, context, created_at, updated_at
                 FROM scheduled_jobs WHERE id = ?1",
                params![id],
                job_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a job. Returns `false` if it did not exist.
pub async fn delete_job(db: &Database, id: &str) -> Result<bool, ChaddiError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute("DELETE FROM scheduled_jobs WHERE id = ?1", params![id])?;
            Ok(removed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Every persisted job, oldest first.
pub async fn list_jobs(db: &Database) -> Result<Vec<ScheduledJob>, ChaddiError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, account_id, context, created_at, updated_at
                 FROM scheduled_jobs ORDER BY created_at",
            )?;
            let rows = stmt.query_map([], job_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of persisted jobs owned by an account.
pub async fn count_for_account(db: &Database, account_id: AccountId) -> Result<usize, ChaddiError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM scheduled_jobs WHERE account_id = ?1",
                params![account_id.0],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| usize::try_from(n).unwrap_or(0))
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_job(id: &str, account: i64) -> ScheduledJob {
        let now = Utc::now();
        ScheduledJob {
            id: id.to_string(),
            chat_id: ChatId(-5),
            account_id: AccountId(account),
            context: Some(JobContext {
                chat_id: -5,
                from_account_id: account,
                reply_to_message_id: 99,
                reminder_message: "chai".into(),
                reminder_time: now.timestamp() + 60,
                job_id: id.to_string(),
            }),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_get_delete() {
        let (db, _dir) = setup_db().await;
        let job = make_job("job-1", 1);
        insert_job(&db, &job).await.unwrap();

        let stored = get_job(&db, "job-1").await.unwrap().unwrap();
        assert_eq!(stored.context, job.context);
        assert_eq!(count_for_account(&db, AccountId(1)).await.unwrap(), 1);
        assert_eq!(count_for_account(&db, AccountId(2)).await.unwrap(), 0);

        assert!(delete_job(&db, "job-1").await.unwrap());
        assert!(!delete_job(&db, "job-1").await.unwrap());
        assert!(get_job(&db, "job-1").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_context_loads_as_none() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO scheduled_jobs VALUES ('bad', -1, 1, 'not json',
                        '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                    [],
                )
            })
            .await
            .unwrap();
        insert_job(&db, &make_job("good", 1)).await.unwrap();

        let jobs = list_jobs(&db).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().any(|j| j.id == "bad" && j.context.is_none()));
        assert!(jobs.iter().any(|j| j.id == "good" && j.context.is_some()));
        db.close().await.unwrap();
    }
}
