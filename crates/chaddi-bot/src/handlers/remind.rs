// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/remind 1h 30m "message"` and its aliases.
//!
//! Sent as a reply, the reminder later answers the replied-to message.

use chaddi_core::{ChaddiError, ChatEvent, Sender};
use chaddi_scheduler::{ReminderOutcome, ReminderRequest};

use super::Reply;
use crate::command::Command;
use crate::context::BotContext;

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    let request = ReminderRequest {
        chat_id: event.chat.id,
        account_id: sender.id,
        reply_to: event
            .reply_to
            .as_ref()
            .map_or(event.message_id, |target| target.message_id),
        args: command.args.clone(),
        text: command.text.clone(),
    };
    Ok(match ctx.reminders.create(request, event.received_at).await? {
        ReminderOutcome::Scheduled { due_secs, .. } => {
            Reply::Text(ReminderOutcome::confirmation(due_secs))
        }
        ReminderOutcome::TooLarge => Reply::Sticker(ctx.config.reminder.too_large_sticker.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::testing::{Fixture, GROUP, sender_of};
    use chaddi_scheduler::REMINDER_USAGE;
    use chaddi_storage::queries::jobs;
    use chaddi_test_utils::events;

    async fn remind(f: &Fixture, event: &ChatEvent) -> Result<Reply, ChaddiError> {
        let command = parse_command(event.text().unwrap(), None).unwrap();
        handle(&f.ctx, event, &sender_of(event), &command).await
    }

    #[tokio::test]
    async fn schedules_and_confirms() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/remindme 1h 30m \"chai\"");
        f.observe(&event).await;

        let reply = remind(&f, &event).await.unwrap();
        assert_eq!(reply, Reply::Text(ReminderOutcome::confirmation(5400)));
        let stored = jobs::list_jobs(&f.ctx.db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].context.as_ref().unwrap().reminder_message, "chai");
        f.ctx.queue.shutdown();
    }

    #[tokio::test]
    async fn reminder_sent_as_a_reply_answers_the_original_message() {
        let f = Fixture::new().await;
        let event = events::replying_to(events::group_text(GROUP, 1, "/remind 5m \"x\""), 2, 77);
        f.observe(&event).await;

        remind(&f, &event).await.unwrap();
        let stored = jobs::list_jobs(&f.ctx.db).await.unwrap();
        assert_eq!(stored[0].context.as_ref().unwrap().reply_to_message_id, 77);

        let plain = events::group_text(GROUP, 1, "/remind 5m \"y\"");
        remind(&f, &plain).await.unwrap();
        let stored = jobs::list_jobs(&f.ctx.db).await.unwrap();
        assert!(
            stored
                .iter()
                .any(|job| job.context.as_ref().unwrap().reply_to_message_id == plain.message_id.0)
        );
        f.ctx.queue.shutdown();
    }

    #[tokio::test]
    async fn missing_delay_is_a_usage_error() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/remind \"soon\"");
        f.observe(&event).await;
        let err = remind(&f, &event).await.unwrap_err();
        assert!(matches!(err, ChaddiError::InvalidInput(ref m) if m == REMINDER_USAGE));
    }

    #[tokio::test]
    async fn absurd_delay_gets_the_sticker() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/alarm 4000d");
        f.observe(&event).await;
        let reply = remind(&f, &event).await.unwrap();
        assert_eq!(
            reply,
            Reply::Sticker(f.ctx.config.reminder.too_large_sticker.clone())
        );
        assert!(jobs::list_jobs(&f.ctx.db).await.unwrap().is_empty());
    }
}
