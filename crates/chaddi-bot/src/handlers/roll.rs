// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/roll`, `/roll start [rule] [username]` and `/roll reset`.

use chaddi_core::{ChaddiError, ChatEvent, Sender};
use chaddi_roll::describe;

use super::Reply;
use crate::command::Command;
use crate::context::BotContext;

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    let now = event.received_at;
    let group_id = event.group_id();
    let sub = command.args.first().map(|a| a.to_lowercase());

    match sub.as_deref() {
        Some("start") => {
            let outcome = ctx
                .roll
                .start(group_id, &command.args, ctx.is_admin(sender.id), now)
                .await?;
            Ok(Reply::text(outcome.reply()))
        }
        Some("reset") => match ctx.roll.reset(group_id, ctx.is_admin(sender.id), now).await {
            Ok(true) => Ok(Reply::Nothing),
            Ok(false) => Ok(Reply::text(describe::REFUSED)),
            Err(ChaddiError::NotFound { .. }) => Ok(Reply::text(describe::NO_ACTIVE_ROLL)),
            Err(e) => Err(e),
        },
        _ => Ok(Reply::Text(ctx.roll.status(group_id, now).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::testing::{ADMIN, Fixture, GROUP, sender_of};
    use chaddi_core::{ChatId, RollState};
    use chaddi_storage::queries::rolls;
    use chaddi_test_utils::events;

    async fn roll(f: &Fixture, event: &ChatEvent) -> Result<Reply, ChaddiError> {
        let command = parse_command(event.text().unwrap(), None).unwrap();
        handle(&f.ctx, event, &sender_of(event), &command).await
    }

    async fn with_members(f: &Fixture) {
        for id in [1, 2, 3] {
            f.observe(&events::group_text(GROUP, id, "hi")).await;
        }
    }

    #[tokio::test]
    async fn status_without_a_roll() {
        let f = Fixture::new().await;
        with_members(&f).await;
        let reply = roll(&f, &events::group_text(GROUP, 1, "/roll")).await.unwrap();
        assert_eq!(reply, Reply::text(describe::NO_ACTIVE_ROLL));
    }

    #[tokio::test]
    async fn private_chat_is_refused() {
        let f = Fixture::new().await;
        let err = roll(&f, &events::private_text(1, "/roll start"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChaddiError::InvalidInput(ref m) if m == describe::GROUP_ONLY));
    }

    #[tokio::test]
    async fn start_then_second_start_is_refused() {
        let f = Fixture::new().await;
        with_members(&f).await;

        let Reply::Text(started) = roll(&f, &events::group_text(GROUP, 1, "/roll start mute_user user3"))
            .await
            .unwrap()
        else {
            panic!("expected text");
        };
        assert!(started.starts_with("<b>Started new roulette!</b>"));
        assert!(started.contains("to mute user3"));

        let stored = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        let again = roll(&f, &events::group_text(GROUP, 2, "/roll start"))
            .await
            .unwrap();
        assert_eq!(again, Reply::text(describe::REFUSED));
        let unchanged = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert_eq!(unchanged.id, stored.id);
    }

    #[tokio::test]
    async fn admin_can_force_a_new_roll() {
        let f = Fixture::new().await;
        with_members(&f).await;
        f.observe(&events::group_text(GROUP, ADMIN, "hi")).await;

        roll(&f, &events::group_text(GROUP, 1, "/roll start")).await.unwrap();
        let first = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        roll(&f, &events::group_text(GROUP, ADMIN, "/roll start")).await.unwrap();
        let second = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn reset_is_admin_only() {
        let f = Fixture::new().await;
        with_members(&f).await;
        roll(&f, &events::group_text(GROUP, 1, "/roll start")).await.unwrap();

        let reply = roll(&f, &events::group_text(GROUP, 1, "/roll reset")).await.unwrap();
        assert_eq!(reply, Reply::text(describe::REFUSED));

        let reply = roll(&f, &events::group_text(GROUP, ADMIN, "/roll reset"))
            .await
            .unwrap();
        assert_eq!(reply, Reply::Nothing);
        let retired = rolls::get_roll(&f.ctx.db, ChatId(GROUP)).await.unwrap();
        assert_eq!(
            chaddi_core::roll_state(retired.as_ref(), chrono::Utc::now()),
            RollState::Absent
        );
    }

    #[tokio::test]
    async fn reset_without_a_roll() {
        let f = Fixture::new().await;
        let reply = roll(&f, &events::group_text(GROUP, ADMIN, "/roll reset"))
            .await
            .unwrap();
        assert_eq!(reply, Reply::text(describe::NO_ACTIVE_ROLL));
    }
}
