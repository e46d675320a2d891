// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable reminders.
//!
//! A reminder is persisted as a [`ScheduledJob`] whose context carries the
//! absolute fire time, then armed on the [`JobQueue`]. On startup
//! [`ReminderService::recover`] re-arms every persisted reminder from its
//! stored fire time.

use std::sync::Arc;
use std::time::Duration;

use chaddi_config::model::ReminderConfig;
use chaddi_core::{
    AccountId, ChaddiError, ChatId, ChatPlatform, JobContext, MessageId, ScheduledJob,
    text::pretty_time_delta,
};
use chaddi_storage::Database;
use chaddi_storage::queries::jobs;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::duration::{extract_reminder_message, parse_reminder_due};
use crate::queue::JobQueue;

/// Reply for a `/remind` without a usable delay.
pub const REMINDER_USAGE: &str = "<b>Usage:</b> <code>/remind 5m \"Chai break\"</code>";

const GREETINGS: &[&str] = &["REMINDER!", "TIME IS UP!", "HELLLOOOO!", "NAMASKAR MANDALI!"];

/// A parsed `/remind` invocation.
#[derive(Debug, Clone)]
pub struct ReminderRequest {
    pub chat_id: ChatId,
    pub account_id: AccountId,
    /// The message the reminder will reply to.
    pub reply_to: MessageId,
    /// Command arguments, used for the delay.
    pub args: Vec<String>,
    /// Full command text, used for the quoted message.
    pub text: String,
}

/// Result of [`ReminderService::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// Persisted and armed.
    Scheduled { job_id: String, due_secs: i64 },
    /// The delay is at or above the configured maximum.
    TooLarge,
}

impl ReminderOutcome {
    /// Confirmation text for a scheduled reminder.
    pub fn confirmation(due_secs: i64) -> String {
        format!(
            "<b>✅ Reminder set!</b>\n\nI will reply to you in {} as a reminder.",
            pretty_time_delta(due_secs)
        )
    }
}

/// Counts from a startup recovery pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    pub rearmed: usize,
    pub fired: usize,
    pub discarded: usize,
}

/// Job name used for a reminder on the queue.
pub fn reminder_job_name(chat_id: i64, account_id: i64, job_id: &str) -> String {
    format!("reminder/{chat_id}/{account_id}/{job_id}")
}

/// Text sent when a reminder fires.
pub fn reminder_text(greeting: &str, message: &str) -> String {
    if message.is_empty() {
        greeting.to_string()
    } else {
        format!("{greeting}\n<b>> {message}</b>")
    }
}

/// Creates, fires and recovers reminders.
#[derive(Clone)]
pub struct ReminderService {
    db: Database,
    platform: Arc<dyn ChatPlatform>,
    queue: JobQueue,
    config: ReminderConfig,
}

impl ReminderService {
    pub fn new(
        db: Database,
        platform: Arc<dyn ChatPlatform>,
        queue: JobQueue,
        config: ReminderConfig,
    ) -> Self {
        Self {
            db,
            platform,
            queue,
            config,
        }
    }

    /// Validate, persist and arm a reminder.
    ///
    /// Fails with `InvalidInput` when the account is at its reminder limit or
    /// the delay is not positive.
    pub async fn create(
        &self,
        request: ReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome, ChaddiError> {
        let active = jobs::count_for_account(&self.db, request.account_id).await?;
        if active >= self.config.max_active_per_account {
            return Err(ChaddiError::InvalidInput(format!(
                "You already have {active} reminders pending!"
            )));
        }

        let due_secs = parse_reminder_due(&request.args);
        if due_secs <= 0 {
            return Err(ChaddiError::InvalidInput(REMINDER_USAGE.to_string()));
        }
        let max = i64::try_from(self.config.max_duration_secs).unwrap_or(i64::MAX);
        if due_secs >= max {
            debug!(account_id = request.account_id.0, due_secs, "reminder too far out");
            return Ok(ReminderOutcome::TooLarge);
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        let context = JobContext {
            chat_id: request.chat_id.0,
            from_account_id: request.account_id.0,
            reply_to_message_id: request.reply_to.0,
            reminder_message: extract_reminder_message(&request.text),
            reminder_time: now.timestamp().saturating_add(due_secs),
            job_id: job_id.clone(),
        };
        let job = ScheduledJob {
            id: job_id.clone(),
            chat_id: request.chat_id,
            account_id: request.account_id,
            context: Some(context.clone()),
            created_at: now,
            updated_at: now,
        };
        jobs::insert_job(&self.db, &job).await?;
        self.arm(&context, due_secs);

        info!(
            chat_id = request.chat_id.0,
            account_id = request.account_id.0,
            job_id = %job_id,
            due_secs,
            "reminder scheduled"
        );
        Ok(ReminderOutcome::Scheduled { job_id, due_secs })
    }

    fn arm(&self, context: &JobContext, due_secs: i64) {
        let name = reminder_job_name(context.chat_id, context.from_account_id, &context.job_id);
        let delay = Duration::from_secs(u64::try_from(due_secs).unwrap_or(0));
        let service = self.clone();
        let job_id = context.job_id.clone();
        self.queue.run_once(name, delay, async move {
            service.fire(&job_id).await;
        });
    }

    /// Deliver a persisted reminder and delete it.
    ///
    /// Never fails: a missing row or unreadable context is logged and the
    /// reminder is dropped.
    pub async fn fire(&self, job_id: &str) {
        if let Err(e) = self.try_fire(job_id).await {
            error!(job_id, error = %e, "reminder failed to fire");
        }
    }

    async fn try_fire(&self, job_id: &str) -> Result<(), ChaddiError> {
        let Some(job) = jobs::get_job(&self.db, job_id).await? else {
            debug!(job_id, "reminder no longer persisted, skipping");
            return Ok(());
        };
        let Some(context) = job.context else {
            warn!(job_id, "reminder has no usable context, dropping");
            jobs::delete_job(&self.db, job_id).await?;
            return Ok(());
        };

        let text = {
            let greeting = GREETINGS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or("REMINDER!");
            reminder_text(greeting, &context.reminder_message)
        };
        let sent = self
            .platform
            .send_text(
                ChatId(context.chat_id),
                &text,
                Some(MessageId(context.reply_to_message_id)),
            )
            .await;
        jobs::delete_job(&self.db, job_id).await?;
        sent?;
        info!(job_id, chat_id = context.chat_id, "reminder delivered");
        Ok(())
    }

    /// Re-arm every persisted reminder. Overdue reminders fire immediately.
    pub async fn recover(&self, now: DateTime<Utc>) -> Result<RecoveryReport, ChaddiError> {
        let mut report = RecoveryReport::default();
        for job in jobs::list_jobs(&self.db).await? {
            let Some(context) = job.context else {
                warn!(job_id = %job.id, "discarding reminder with unreadable context");
                jobs::delete_job(&self.db, &job.id).await?;
                report.discarded += 1;
                continue;
            };
            let due_secs = context.due_in(now);
            if due_secs <= 0 {
                warn!(job_id = %job.id, overdue_secs = -due_secs, "firing overdue reminder");
                self.fire(&job.id).await;
                report.fired += 1;
            } else {
                self.arm(&context, due_secs);
                report.rearmed += 1;
            }
        }
        info!(
            rearmed = report.rearmed,
            fired = report.fired,
            discarded = report.discarded,
            "reminder recovery complete"
        );
        Ok(report)
    }
}
