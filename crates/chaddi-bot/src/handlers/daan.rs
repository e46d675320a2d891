// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/daan`: give rokda to someone.
//!
//! The receiver is, in order: the sender of the replied-to message, the
//! first username-less mention, or the `@username` in the first argument.

use chaddi_core::text::{ROKDA, escape_html, format_rokda};
use chaddi_core::{Account, ChaddiError, ChatEvent, Sender};
use chaddi_economy::{TransferOutcome, parse_daan_amount, transfer};

use super::Reply;
use crate::command::Command;
use crate::context::BotContext;

pub const USAGE: &str = "Haat chutiya! Syntax is <code>/daan @username 786</code>";
pub const NOT_ENOUGH: &str = "Gareeb saale! You don't have enough ₹okda!";

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    if command.args.is_empty() {
        return Ok(Reply::text(USAGE));
    }
    let now = event.received_at;

    let reply_sender = event.reply_to.as_ref().and_then(|r| r.sender.as_ref());
    let (receiver, amount_tokens): (Account, &[String]) =
        if let Some(target) = reply_sender {
            (ctx.ledger.get_or_create(target, now).await?, &command.args[..])
        } else if let Some(mentioned) = event.mentions.first() {
            (ctx.ledger.get_or_create(mentioned, now).await?, &command.args[1..])
        } else {
            let username = command.args[0].trim_start_matches('@');
            match ctx.ledger.find_by_username(username).await? {
                Some(account) => (account, &command.args[1..]),
                None => {
                    return Ok(Reply::Text(format!(
                        "{}??? Who dat???",
                        escape_html(username)
                    )));
                }
            }
        };

    let amount = parse_daan_amount(amount_tokens)?;
    let giver = ctx.ledger.get_or_create(sender, now).await?;
    let outcome = transfer(
        &ctx.db,
        giver.id,
        receiver.id,
        amount,
        ctx.config.economy.zero_sender_on_non_finite_daan,
    )
    .await?;

    Ok(match outcome {
        TransferOutcome::Completed {
            sender,
            receiver,
            amount,
        } => Reply::Text(format!(
            "{} gave {} 🤲 a daan of {} {ROKDA}! 🎉",
            escape_html(&sender.pretty_name()),
            escape_html(&receiver.pretty_name()),
            format_rokda(amount)
        )),
        TransferOutcome::Insufficient => Reply::text(NOT_ENOUGH),
        TransferOutcome::SelfTransfer => {
            Reply::Sticker(ctx.config.economy.self_daan_sticker.clone())
        }
        TransferOutcome::SenderZeroed { sender } => Reply::Text(format!(
            "Yeh dekho chutiyapa chal ra hai. Setting {}'s rokda to 0!",
            escape_html(&sender.pretty_name())
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::testing::{Fixture, GROUP, sender_of};
    use chaddi_economy::transfer::AMOUNT_USAGE;
    use chaddi_test_utils::events;

    async fn daan(f: &Fixture, event: &ChatEvent) -> Result<Reply, ChaddiError> {
        let command = parse_command(event.text().unwrap(), None).unwrap();
        handle(&f.ctx, event, &sender_of(event), &command).await
    }

    async fn two_members(f: &Fixture) {
        f.observe(&events::group_text(GROUP, 1, "hi")).await;
        f.observe(&events::group_text(GROUP, 2, "hi")).await;
        f.set_balance(1, 500.0).await;
        f.set_balance(2, 200.0).await;
    }

    #[tokio::test]
    async fn no_arguments_shows_usage() {
        let f = Fixture::new().await;
        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan")).await.unwrap();
        assert_eq!(reply, Reply::text(USAGE));
    }

    #[tokio::test]
    async fn gives_by_username() {
        let f = Fixture::new().await;
        two_members(&f).await;

        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan @user2 100"))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::text("user1 gave user2 🤲 a daan of 100 ₹okda! 🎉")
        );
        assert_eq!(f.balance(1).await, 400.0);
        assert_eq!(f.balance(2).await, 300.0);
    }

    #[tokio::test]
    async fn reply_target_takes_the_whole_argument_list() {
        let f = Fixture::new().await;
        two_members(&f).await;

        let event = events::replying_to(events::group_text(GROUP, 1, "/daan 12 .5"), 2, 9);
        daan(&f, &event).await.unwrap();
        assert_eq!(f.balance(1).await, 487.5);
        assert_eq!(f.balance(2).await, 212.5);
    }

    #[tokio::test]
    async fn text_mention_is_a_receiver() {
        let f = Fixture::new().await;
        two_members(&f).await;

        let event = events::mentioning(events::group_text(GROUP, 1, "/daan User 50"), 2);
        daan(&f, &event).await.unwrap();
        assert_eq!(f.balance(2).await, 250.0);
    }

    #[tokio::test]
    async fn unknown_username() {
        let f = Fixture::new().await;
        two_members(&f).await;
        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan @nobody 5"))
            .await
            .unwrap();
        assert_eq!(reply, Reply::text("nobody??? Who dat???"));
    }

    #[tokio::test]
    async fn bad_amount_is_invalid_input() {
        let f = Fixture::new().await;
        two_members(&f).await;
        let err = daan(&f, &events::group_text(GROUP, 1, "/daan @user2 lots"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChaddiError::InvalidInput(ref m) if m == AMOUNT_USAGE));
    }

    #[tokio::test]
    async fn insufficient_balance_changes_nothing() {
        let f = Fixture::new().await;
        two_members(&f).await;
        f.set_balance(1, 50.0).await;

        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan @user2 100"))
            .await
            .unwrap();
        assert_eq!(reply, Reply::text(NOT_ENOUGH));
        assert_eq!(f.balance(1).await, 50.0);
        assert_eq!(f.balance(2).await, 200.0);
    }

    #[tokio::test]
    async fn self_daan_sends_the_sticker() {
        let f = Fixture::new().await;
        two_members(&f).await;
        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan @user1 10"))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::Sticker(f.ctx.config.economy.self_daan_sticker.clone())
        );
        assert_eq!(f.balance(1).await, 500.0);
    }

    #[tokio::test]
    async fn infinite_amount_zeroes_the_giver() {
        let f = Fixture::new().await;
        two_members(&f).await;
        let reply = daan(&f, &events::group_text(GROUP, 1, "/daan @user2 inf"))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::text("Yeh dekho chutiyapa chal ra hai. Setting user1's rokda to 0!")
        );
        assert_eq!(f.balance(1).await, 0.0);
        assert_eq!(f.balance(2).await, 200.0);
    }
}
