// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/rokda`: show a balance.

use chaddi_core::text::{ROKDA, escape_html, format_rokda};
use chaddi_core::{Account, ChaddiError, ChatEvent, Sender};

use super::Reply;
use crate::context::BotContext;

pub fn balance_message(account: &Account) -> String {
    format!(
        "💰 {} has {} {ROKDA}!",
        escape_html(&account.pretty_name()),
        format_rokda(account.balance)
    )
}

/// The replied-to user's balance, or the invoker's.
pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
) -> Result<Reply, ChaddiError> {
    let target = event
        .reply_to
        .as_ref()
        .and_then(|reply| reply.sender.as_ref())
        .unwrap_or(sender);
    let account = ctx.ledger.get_or_create(target, event.received_at).await?;
    Ok(Reply::Text(balance_message(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, GROUP, sender_of};
    use chaddi_test_utils::events;

    #[tokio::test]
    async fn shows_own_balance() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/rokda");
        f.observe(&event).await;
        f.set_balance(1, 1234.5).await;

        let reply = handle(&f.ctx, &event, &sender_of(&event)).await.unwrap();
        assert_eq!(reply, Reply::text("💰 user1 has 1234.5 ₹okda!"));
    }

    #[tokio::test]
    async fn reply_shows_the_other_users_balance() {
        let f = Fixture::new().await;
        let event = events::replying_to(events::group_text(GROUP, 1, "/rokda"), 2, 5);

        let reply = handle(&f.ctx, &event, &sender_of(&event)).await.unwrap();
        // user2 was never seen, so they get the starting balance.
        assert_eq!(reply, Reply::text("💰 user2 has 500 ₹okda!"));
    }
}
