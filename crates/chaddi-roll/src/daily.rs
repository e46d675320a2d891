// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The daily roll: a fresh roll in every quiet group at fixed local times.

use chaddi_config::model::RollConfig;
use chaddi_config::validation::parse_daily_time;
use chaddi_core::ChaddiError;
use chaddi_scheduler::JobQueue;
use chrono::{FixedOffset, NaiveTime, Utc};
use tracing::{error, info};

use crate::game::RollGame;

/// Queue name of the daily roll job.
pub const DAILY_ROLL_JOB: &str = "daily_roll";

/// The configured local times and offset of the daily roll.
pub fn daily_schedule(config: &RollConfig) -> Result<(Vec<NaiveTime>, FixedOffset), ChaddiError> {
    let times = config
        .daily_times
        .iter()
        .map(|raw| {
            parse_daily_time(raw)
                .ok_or_else(|| ChaddiError::Config(format!("invalid daily roll time `{raw}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
        ChaddiError::Config(format!(
            "invalid utc offset {} minutes",
            config.utc_offset_minutes
        ))
    })?;
    Ok((times, offset))
}

/// Arm the daily roll on `queue`. Returns `false` when it is disabled.
pub fn schedule_daily(game: RollGame, queue: &JobQueue) -> Result<bool, ChaddiError> {
    if !game.config().daily_enabled {
        info!("daily roll disabled");
        return Ok(false);
    }
    let (times, offset) = daily_schedule(game.config())?;
    if times.is_empty() {
        return Ok(false);
    }
    queue.run_daily(DAILY_ROLL_JOB, times, offset, move || {
        let game = game.clone();
        async move {
            if let Err(e) = game.daily_round(Utc::now()).await {
                error!(error = %e, "daily roll round failed");
            }
        }
    });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chaddi_storage::Database;
    use chaddi_test_utils::MockPlatform;
    use tempfile::tempdir;

    #[test]
    fn default_schedule_is_ist() {
        let (times, offset) = daily_schedule(&RollConfig::default()).unwrap();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap()
            ]
        );
        assert_eq!(offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn bad_time_is_a_config_error() {
        let config = RollConfig {
            daily_times: vec!["25:99".into()],
            ..RollConfig::default()
        };
        assert!(matches!(
            daily_schedule(&config),
            Err(ChaddiError::Config(_))
        ));
    }

    async fn game(config: RollConfig, queue: &JobQueue) -> (RollGame, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let game = RollGame::new(db, Arc::new(MockPlatform::new()), queue.clone(), config, None);
        (game, dir)
    }

    #[tokio::test]
    async fn schedule_registers_one_daily_job() {
        let queue = JobQueue::new();
        let (game, _dir) = game(RollConfig::default(), &queue).await;
        assert!(schedule_daily(game, &queue).unwrap());
        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, DAILY_ROLL_JOB);
        queue.shutdown();
    }

    #[tokio::test]
    async fn disabled_daily_roll_is_not_scheduled() {
        let queue = JobQueue::new();
        let config = RollConfig {
            daily_enabled: false,
            ..RollConfig::default()
        };
        let (game, _dir) = game(config, &queue).await;
        assert!(!schedule_daily(game, &queue).unwrap());
        assert!(queue.jobs().is_empty());
    }
}
