// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daan: moving rokda from one account to another.

use chaddi_core::{Account, AccountId, ChaddiError, text::round2};
use chaddi_storage::Database;
use chaddi_storage::queries::accounts;
use tracing::{info, warn};

/// Reply when the amount cannot be parsed.
pub const AMOUNT_USAGE: &str = "Kitna ₹okda be???";

/// A parsed daan amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DaanAmount {
    /// Non-negative, rounded to two decimals.
    Finite(f64),
    /// `inf`, `nan` and friends.
    NonFinite,
}

/// Parse the amount from the tokens after the receiver.
///
/// Tokens are joined without spaces, parsed as a float, rounded to two
/// decimals and made non-negative.
pub fn parse_daan_amount<S: AsRef<str>>(tokens: &[S]) -> Result<DaanAmount, ChaddiError> {
    let joined: String = tokens.iter().map(|t| t.as_ref()).collect();
    let value: f64 = joined
        .trim()
        .parse()
        .map_err(|_| ChaddiError::InvalidInput(AMOUNT_USAGE.to_string()))?;
    let value = round2(value).abs();
    if value.is_finite() {
        Ok(DaanAmount::Finite(value))
    } else {
        Ok(DaanAmount::NonFinite)
    }
}

/// What happened to a daan.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Funds moved. Both accounts are as persisted afterwards.
    Completed {
        sender: Account,
        receiver: Account,
        amount: f64,
    },
    /// The sender would go negative. Nothing changed.
    Insufficient,
    /// Sender and receiver are the same account. Nothing changed.
    SelfTransfer,
    /// A non-finite amount zeroed the sender's balance.
    SenderZeroed { sender: Account },
}

enum PairResult {
    Moved,
    Insufficient,
}

/// Move `amount` from `sender` to `receiver`.
///
/// Checks run in this order: non-finite amount, insufficient balance,
/// self-transfer. A non-finite amount zeroes the sender when
/// `zero_sender_on_non_finite` is set and is rejected as invalid input
/// otherwise. The move itself happens in a single transaction.
pub async fn transfer(
    db: &Database,
    sender: AccountId,
    receiver: AccountId,
    amount: DaanAmount,
    zero_sender_on_non_finite: bool,
) -> Result<TransferOutcome, ChaddiError> {
    let amount = match amount {
        DaanAmount::Finite(a) => a,
        DaanAmount::NonFinite if zero_sender_on_non_finite => {
            warn!(account_id = sender.0, "non-finite daan, zeroing sender");
            let (account, ()) = accounts::update_account(db, sender, |a| a.balance = 0.0)
                .await?
                .ok_or_else(|| ChaddiError::not_found("account", sender))?;
            return Ok(TransferOutcome::SenderZeroed { sender: account });
        }
        DaanAmount::NonFinite => {
            return Err(ChaddiError::InvalidInput(AMOUNT_USAGE.to_string()));
        }
    };

    if sender == receiver {
        let account = accounts::get_account(db, sender)
            .await?
            .ok_or_else(|| ChaddiError::not_found("account", sender))?;
        if account.balance - amount < 0.0 {
            return Ok(TransferOutcome::Insufficient);
        }
        info!(account_id = sender.0, "self daan refused");
        return Ok(TransferOutcome::SelfTransfer);
    }

    let result = accounts::update_account_pair(db, sender, receiver, move |from, to| {
        if from.balance - amount < 0.0 {
            return PairResult::Insufficient;
        }
        from.balance = round2(from.balance - amount);
        to.balance = round2(to.balance + amount);
        PairResult::Moved
    })
    .await?
    .ok_or_else(|| ChaddiError::not_found("account", receiver))?;

    match result {
        (_, _, PairResult::Insufficient) => Ok(TransferOutcome::Insufficient),
        (from, to, PairResult::Moved) => {
            info!(
                sender = sender.0,
                receiver = receiver.0,
                amount,
                sender_balance = from.balance,
                receiver_balance = to.balance,
                "daan committed"
            );
            Ok(TransferOutcome::Completed {
                sender: from,
                receiver: to,
                amount,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    async fn setup(balances: &[(i64, f64)]) -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let now = Utc::now();
        for (id, balance) in balances {
            let account = Account::new(AccountId(*id), None, format!("u{id}"), *balance, now);
            accounts::upsert_profile(&db, account, now).await.unwrap();
        }
        (db, dir)
    }

    async fn balance(db: &Database, id: i64) -> f64 {
        accounts::get_account(db, AccountId(id))
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_daan_amount(&["100"]).unwrap(), DaanAmount::Finite(100.0));
        assert_eq!(parse_daan_amount(&["-12.5"]).unwrap(), DaanAmount::Finite(12.5));
        assert_eq!(parse_daan_amount(&["1", "00"]).unwrap(), DaanAmount::Finite(100.0));
        assert_eq!(parse_daan_amount(&["inf"]).unwrap(), DaanAmount::NonFinite);
        assert_eq!(parse_daan_amount(&["nan"]).unwrap(), DaanAmount::NonFinite);
        let err = parse_daan_amount(&["bahut"]).unwrap_err();
        assert_eq!(err.to_string(), AMOUNT_USAGE);
        let empty: [&str; 0] = [];
        assert!(parse_daan_amount(&empty).is_err());
    }

    #[tokio::test]
    async fn completed_transfer_moves_funds() {
        let (db, _dir) = setup(&[(1, 500.0), (2, 200.0)]).await;
        let outcome = transfer(&db, AccountId(1), AccountId(2), DaanAmount::Finite(100.0), true)
            .await
            .unwrap();
        assert!(matches!(outcome, TransferOutcome::Completed { amount, .. } if amount == 100.0));
        assert_eq!(balance(&db, 1).await, 400.0);
        assert_eq!(balance(&db, 2).await, 300.0);

        // Replaying moves funds again.
        transfer(&db, AccountId(1), AccountId(2), DaanAmount::Finite(100.0), true)
            .await
            .unwrap();
        assert_eq!(balance(&db, 1).await, 300.0);
    }

    #[tokio::test]
    async fn insufficient_balance_changes_nothing() {
        let (db, _dir) = setup(&[(1, 50.0), (2, 200.0)]).await;
        let outcome = transfer(&db, AccountId(1), AccountId(2), DaanAmount::Finite(100.0), true)
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Insufficient);
        assert_eq!(balance(&db, 1).await, 50.0);
        assert_eq!(balance(&db, 2).await, 200.0);
    }

    #[tokio::test]
    async fn self_transfer_is_refused() {
        let (db, _dir) = setup(&[(1, 500.0)]).await;
        let outcome = transfer(&db, AccountId(1), AccountId(1), DaanAmount::Finite(10.0), true)
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::SelfTransfer);
        assert_eq!(balance(&db, 1).await, 500.0);
    }

    #[tokio::test]
    async fn non_finite_amount_policy() {
        let (db, _dir) = setup(&[(1, 500.0), (2, 0.0)]).await;
        let err = transfer(&db, AccountId(1), AccountId(2), DaanAmount::NonFinite, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ChaddiError::InvalidInput(_)));
        assert_eq!(balance(&db, 1).await, 500.0);

        let outcome = transfer(&db, AccountId(1), AccountId(2), DaanAmount::NonFinite, true)
            .await
            .unwrap();
        assert!(matches!(outcome, TransferOutcome::SenderZeroed { .. }));
        assert_eq!(balance(&db, 1).await, 0.0);
        assert_eq!(balance(&db, 2).await, 0.0);
    }

    #[tokio::test]
    async fn unknown_receiver_is_not_found() {
        let (db, _dir) = setup(&[(1, 500.0)]).await;
        let err = transfer(&db, AccountId(1), AccountId(99), DaanAmount::Finite(1.0), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ChaddiError::NotFound { .. }));
        assert_eq!(balance(&db, 1).await, 500.0);
    }
}
