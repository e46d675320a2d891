// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event loop.
//!
//! Every inbound event is synced into the ledger, checked against the
//! sender's roll effects, played against the group's roll if it is a die,
//! and otherwise parsed as a command. Events from one chat are handled in
//! arrival order on that chat's lane while different chats run concurrently.
//! Every handler error is turned into a reply by [`reply_for_error`].

use std::sync::Arc;
use std::time::Duration;

use chaddi_core::{ChaddiError, ChatEvent, ChatId, EventPayload, Sender};
use chaddi_economy::Activity;
use chaddi_roll::{DiceOutcome, schedule_daily};
use chaddi_scheduler::RecoveryReport;
use chaddi_storage::CommandUsage;
use chaddi_storage::queries::{accounts, activity};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::admission::{Admission, admit};
use crate::command::{Command, parse_command};
use crate::context::BotContext;
use crate::enforcement::{Verdict, enforce};
use crate::errors::reply_for_error;
use crate::handlers::{self, Reply};

/// How long shutdown waits for in-flight handlers.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What startup recovery found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub reminders: RecoveryReport,
    pub rollbacks_rearmed: usize,
    pub suttas_extinguished: usize,
    pub daily_roll: bool,
}

/// Drives the bot: receives events and runs handlers until cancelled.
pub struct Dispatcher {
    ctx: Arc<BotContext>,
    tasks: TaskTracker,
    /// One ordered queue per chat, each drained by its own task.
    lanes: DashMap<ChatId, mpsc::UnboundedSender<ChatEvent>>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            ctx,
            tasks: TaskTracker::new(),
            lanes: DashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Re-arm persisted reminders and roll rollbacks, put out suttas whose
    /// burn timer died with the last process, then schedule the daily roll.
    pub async fn start(&self, now: DateTime<Utc>) -> Result<StartupReport, ChaddiError> {
        let reminders = self.ctx.reminders.recover(now).await?;
        let rollbacks_rearmed = self.ctx.roll.recover(now).await?;
        let suttas_extinguished = accounts::clear_sutta_progress(&self.ctx.db).await?;
        let daily_roll = schedule_daily(self.ctx.roll.clone(), &self.ctx.queue)?;
        let report = StartupReport {
            reminders,
            rollbacks_rearmed,
            suttas_extinguished,
            daily_roll,
        };
        info!(?report, "startup recovery complete");
        Ok(report)
    }

    /// Receive and dispatch events until `cancel` fires or the platform
    /// stops delivering.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ChaddiError> {
        info!(bot = %self.ctx.config.bot.name, "dispatcher running");

        loop {
            tokio::select! {
                event = self.ctx.platform.receive() => {
                    match event {
                        Ok(event) => self.route(event),
                        Err(e) => {
                            error!(error = %e, "platform receive failed, stopping");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Queue `event` on its chat's lane, opening the lane on first use.
    fn route(&self, event: ChatEvent) {
        let chat_id = event.chat.id;
        let event = match self.lanes.get(&chat_id) {
            Some(lane) => match lane.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        if tx.send(event).is_err() {
            return;
        }
        self.lanes.insert(chat_id, tx);
        let ctx = Arc::clone(&self.ctx);
        self.tasks.spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_event(&ctx, event).await;
            }
            debug!(chat_id = chat_id.0, "chat lane closed");
        });
    }

    /// Wait for in-flight handlers, stop timers, disconnect and close the
    /// database. Persisted reminders and rollbacks survive for the next start.
    pub async fn shutdown(self) -> Result<(), ChaddiError> {
        // Dropping the senders lets each lane finish what it has queued.
        self.lanes.clear();
        self.tasks.close();
        if tokio::time::timeout(DRAIN_TIMEOUT, self.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                remaining = self.tasks.len(),
                "timeout reached, some handlers interrupted"
            );
        }

        self.ctx.queue.shutdown();
        if let Err(e) = self.ctx.platform.shutdown().await {
            warn!(error = %e, "platform shutdown failed");
        }
        self.ctx.db.clone().close().await?;
        info!("dispatcher stopped");
        Ok(())
    }
}

/// Process one inbound event. Never fails: every error is logged or replied.
pub async fn handle_event(ctx: &BotContext, event: ChatEvent) {
    if let Err(e) = process(ctx, &event).await {
        error!(
            chat_id = event.chat.id.0,
            account_id = event.sender.as_ref().map(|s| s.id.0),
            error = %e,
            "failed to process event"
        );
    }
}

async fn process(ctx: &BotContext, event: &ChatEvent) -> Result<(), ChaddiError> {
    let command = event
        .text()
        .and_then(|text| parse_command(text, ctx.bot_username()));
    let activity = if command.is_some() {
        Activity::Command
    } else {
        Activity::Chat
    };
    ctx.ledger.observe(event, activity).await?;
    let Some(sender) = event.sender.as_ref() else {
        return Ok(());
    };
    if sender.is_bot {
        return Ok(());
    }
    if enforce(ctx, event).await? == Verdict::Removed {
        return Ok(());
    }

    match &event.payload {
        EventPayload::Dice { value } => {
            if let Some(group_id) = event.group_id() {
                let outcome = ctx
                    .roll
                    .on_dice(group_id, sender.id, *value, event.message_id, event.received_at)
                    .await?;
                if let DiceOutcome::Won(roll) | DiceOutcome::KickFailed(roll) = &outcome {
                    debug!(group_id = group_id.0, roll_id = %roll.id, "dice resolved the roll");
                }
            }
        }
        EventPayload::Text(_) => {
            if let Some(command) = &command {
                run_command(ctx, event, sender, command).await;
            }
        }
        _ => {}
    }
    Ok(())
}

async fn run_command(ctx: &BotContext, event: &ChatEvent, sender: &Sender, command: &Command) {
    let name = command.command.name();
    let reply = match execute(ctx, event, sender, command).await {
        Ok(reply) => reply,
        Err(e) => Reply::Text(reply_for_error(&e, name, event)),
    };
    if let Err(e) = send_reply(ctx, event, reply).await {
        error!(command = name, chat_id = event.chat.id.0, error = %e, "failed to send reply");
    }
}

async fn execute(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    match admit(ctx, event, sender.id, command).await? {
        Admission::Run => {}
        Admission::Drop => return Ok(Reply::Nothing),
        Admission::Deny(message) => return Ok(Reply::Text(message)),
    }

    let name = command.command.name();
    info!(
        command = name,
        invoked_as = %command.invoked_as,
        chat_id = event.chat.id.0,
        account_id = sender.id.0,
        "command"
    );
    let usage = CommandUsage {
        command: name.to_string(),
        account_id: Some(sender.id),
        chat_id: event.chat.id,
        used_at: event.received_at,
    };
    if let Err(e) = activity::record_command_usage(&ctx.db, &usage).await {
        warn!(command = name, error = %e, "failed to record command usage");
    }

    handlers::run(ctx, event, sender, command).await
}

async fn send_reply(ctx: &BotContext, event: &ChatEvent, reply: Reply) -> Result<(), ChaddiError> {
    let reply_to = Some(event.message_id);
    match reply {
        Reply::Text(text) => {
            ctx.platform.send_text(event.chat.id, &text, reply_to).await?;
        }
        Reply::Sticker(sticker) => {
            ctx.platform
                .send_sticker(event.chat.id, &sticker, reply_to)
                .await?;
        }
        Reply::Nothing => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ADMIN, Fixture, GROUP, test_config};
    use chaddi_core::{AccountId, ChatId, EffectKind};
    use chaddi_storage::queries::{accounts, groups, rolls};
    use chaddi_test_utils::{Outbound, events};

    #[tokio::test]
    async fn command_reply_goes_to_the_command_message() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/rokda");
        let message_id = event.message_id;
        handle_event(&f.ctx, event).await;

        let sent = f.platform.sent().await;
        assert_eq!(sent.len(), 1);
        let Outbound::Text { text, reply_to, chat_id, .. } = &sent[0] else {
            panic!("expected text");
        };
        assert_eq!(*chat_id, ChatId(GROUP));
        assert_eq!(*reply_to, Some(message_id));
        assert_eq!(text, "💰 user1 has 500 ₹okda!");
        assert_eq!(
            activity::count_command_usage(&f.ctx.db, "rokda").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn plain_text_only_syncs_the_ledger() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "hello")).await;
        assert_eq!(f.platform.sent_count().await, 0);
        assert_eq!(
            groups::list_members(&f.ctx.db, ChatId(GROUP)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn commands_for_other_bots_are_ignored() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda@other_bot")).await;
        assert_eq!(f.platform.sent_count().await, 0);
        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda@chaddi_bot")).await;
        assert_eq!(f.platform.sent_count().await, 1);
    }

    #[tokio::test]
    async fn handler_errors_become_replies() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::private_text(1, "/roll start")).await;
        assert_eq!(
            f.platform.last_text().await.as_deref(),
            Some(chaddi_roll::describe::GROUP_ONLY)
        );
    }

    #[tokio::test]
    async fn disabled_commands_are_silent() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "hi")).await;
        groups::update_group_metadata(&f.ctx.db, ChatId(GROUP), |m| {
            m.disabled_commands.push("rokda".into())
        })
        .await
        .unwrap();

        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda")).await;
        assert_eq!(f.platform.sent_count().await, 0);
        handle_event(&f.ctx, events::private_text(1, "/rokda")).await;
        assert_eq!(f.platform.sent_count().await, 1);
    }

    #[tokio::test]
    async fn rate_limit_drops_rapid_commands() {
        let mut config = test_config();
        config.bot.command_cooldown_ms = 60_000;
        let f = Fixture::with_config(config).await;

        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda")).await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda")).await;
        assert_eq!(f.platform.sent_count().await, 1);
    }

    #[tokio::test]
    async fn paywall_refusal_is_replied_and_handler_skipped() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "hi")).await;
        f.set_balance(1, 100.0).await;

        handle_event(&f.ctx, events::group_text(GROUP, 1, "/sutta")).await;
        assert_eq!(
            f.platform.last_text().await.as_deref(),
            Some("Sorry! You don't have enough ₹okda! Each <code>/sutta</code> costs 200 ₹okda.")
        );
        let account = accounts::get_account(&f.ctx.db, AccountId(1)).await.unwrap().unwrap();
        assert_eq!(account.metadata.sutta_progress(), None);
        assert_eq!(activity::count_command_usage(&f.ctx.db, "sutta").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn muted_sender_commands_never_run() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "hi")).await;
        accounts::update_account(&f.ctx.db, AccountId(1), |a| {
            a.metadata.add_effect(EffectKind::Muted, GROUP);
        })
        .await
        .unwrap();

        handle_event(&f.ctx, events::group_text(GROUP, 1, "/rokda")).await;
        let sent = f.platform.sent().await;
        assert!(matches!(&sent[..], [Outbound::Delete { .. }]));
    }

    #[tokio::test]
    async fn dice_resolves_an_open_roll() {
        let f = Fixture::new().await;
        for id in [1, 2] {
            handle_event(&f.ctx, events::group_text(GROUP, id, "hi")).await;
        }
        handle_event(&f.ctx, events::group_text(GROUP, 1, "/roll start mute_user user2")).await;
        let roll = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        f.platform.clear_sent().await;

        handle_event(&f.ctx, events::dice(GROUP, 1, roll.goal)).await;
        let won = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert_eq!(won.winner_id, Some(AccountId(1)));
        assert!(f.platform.last_text().await.unwrap().starts_with("<b>WINRAR!!!</b>"));
        f.ctx.queue.shutdown();
    }

    #[tokio::test]
    async fn run_stops_on_cancel_and_shutdown_closes() {
        let f = Fixture::new().await;
        let dispatcher = Dispatcher::new(Arc::clone(&f.ctx));
        let report = dispatcher.start(Utc::now()).await.unwrap();
        assert!(report.daily_roll);

        let cancel = CancellationToken::new();
        f.platform
            .inject_event(events::group_text(GROUP, 1, "/rokda"))
            .await;
        let run = {
            let cancel = cancel.clone();
            async move {
                dispatcher.run(cancel).await.unwrap();
                dispatcher
            }
        };
        let handle = tokio::spawn(run);
        f.platform.wait_for_sent(1, Duration::from_secs(5)).await;
        cancel.cancel();
        let dispatcher = handle.await.unwrap();
        dispatcher.shutdown().await.unwrap();
        assert!(f.ctx.queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn events_from_one_chat_run_in_arrival_order() {
        let f = Fixture::new().await;
        let dispatcher = Dispatcher::new(Arc::clone(&f.ctx));
        for (id, text) in [
            (ADMIN, "/toggle gamble"),
            (1, "/gamble"),
            (1, "/rokda"),
        ] {
            f.platform.inject_event(events::group_text(GROUP, id, text)).await;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                dispatcher.run(cancel).await.unwrap();
                dispatcher
            }
        });
        f.platform.wait_for_sent(2, Duration::from_secs(5)).await;
        cancel.cancel();
        handle.await.unwrap().shutdown().await.unwrap();

        // The toggle landed before /gamble, so only two replies exist.
        assert_eq!(
            f.platform.sent_texts().await,
            vec![
                "<code>/gamble</code> is now disabled in this group.".to_string(),
                "💰 user1 has 500 ₹okda!".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn startup_puts_out_suttas_left_burning() {
        let f = Fixture::new().await;
        handle_event(&f.ctx, events::group_text(GROUP, 1, "hi")).await;
        accounts::update_account(&f.ctx.db, AccountId(1), |a| {
            a.balance = 1000.0;
            a.metadata.set_sutta_progress(Some(3));
        })
        .await
        .unwrap();

        let dispatcher = Dispatcher::new(Arc::clone(&f.ctx));
        let report = dispatcher.start(Utc::now()).await.unwrap();
        assert_eq!(report.suttas_extinguished, 1);

        handle_event(&f.ctx, events::group_text(GROUP, 1, "/sutta")).await;
        assert_eq!(
            f.platform.sent_texts().await.first().map(String::as_str),
            Some(crate::handlers::sutta::LIGHTING)
        );
        f.ctx.queue.shutdown();
    }
}
