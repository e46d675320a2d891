// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/gamble`.

use chaddi_core::{ChaddiError, ChatEvent, Sender};
use chaddi_economy::{GambleResult, gamble};

use super::Reply;
use crate::context::BotContext;

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
) -> Result<Reply, ChaddiError> {
    let account = ctx.ledger.get_or_create(sender, event.received_at).await?;
    let result = gamble(
        &ctx.db,
        account.id,
        event.group_id(),
        ctx.gamble_rules(),
        event.received_at,
    )
    .await?;
    Ok(match result {
        GambleResult::Refused(text) | GambleResult::Played { text, .. } => Reply::Text(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, GROUP, sender_of};
    use chaddi_economy::gamble::COOLDOWN_MESSAGE;
    use chaddi_test_utils::events;

    #[tokio::test]
    async fn too_poor_to_gamble() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/gamble");
        f.observe(&event).await;
        f.set_balance(1, 10.0).await;

        let reply = handle(&f.ctx, &event, &sender_of(&event)).await.unwrap();
        assert_eq!(
            reply,
            Reply::text("Sorry you need atleast 50 ₹okda to gamble! Come back later...")
        );
        assert_eq!(f.balance(1).await, 10.0);
    }

    #[tokio::test]
    async fn second_gamble_hits_the_cooldown() {
        let f = Fixture::new().await;
        f.observe(&events::group_text(GROUP, 2, "hi")).await;
        let first = events::group_text(GROUP, 1, "/gamble");
        f.observe(&first).await;

        let Reply::Text(played) = handle(&f.ctx, &first, &sender_of(&first)).await.unwrap() else {
            panic!("expected text");
        };
        assert_ne!(played, COOLDOWN_MESSAGE);
        let after_first = (f.balance(1).await, f.balance(2).await);

        let second = events::group_text(GROUP, 1, "/gamble");
        let reply = handle(&f.ctx, &second, &sender_of(&second)).await.unwrap();
        assert_eq!(reply, Reply::text(COOLDOWN_MESSAGE));
        assert_eq!((f.balance(1).await, f.balance(2).await), after_first);
    }
}
