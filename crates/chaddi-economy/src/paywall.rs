// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-command costs debited before a paid command runs.

use std::collections::BTreeMap;

use chaddi_core::{AccountId, ChaddiError, text::{ROKDA, format_rokda}};
use chaddi_storage::Database;
use chaddi_storage::queries::accounts;
use tracing::{debug, info};

/// Result of charging for a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Charge {
    /// The command has no cost.
    Free,
    /// `cost` was debited.
    Paid(f64),
    /// The balance was not strictly above the cost; nothing was debited.
    Refused { message: String },
}

/// The standard reply when an account cannot afford a command.
pub fn insufficient_message(command: &str, cost: f64) -> String {
    format!(
        "Sorry! You don't have enough {ROKDA}! Each <code>/{command}</code> costs {} {ROKDA}.",
        format_rokda(cost)
    )
}

/// Debit `cost` if and only if the balance is strictly greater than it.
pub async fn paywall(db: &Database, account_id: AccountId, cost: f64) -> Result<bool, ChaddiError> {
    accounts::debit_if_above(db, account_id, cost).await
}

/// Command cost table backed by the ledger.
#[derive(Clone)]
pub struct Paywall {
    db: Database,
    costs: BTreeMap<String, f64>,
}

impl Paywall {
    pub fn new(db: Database, costs: BTreeMap<String, f64>) -> Self {
        Self { db, costs }
    }

    /// Cost of `command`, if it is a paid command.
    pub fn cost_of(&self, command: &str) -> Option<f64> {
        self.costs.get(command).copied().filter(|c| *c > 0.0)
    }

    /// Charge `account_id` for one use of `command`.
    pub async fn charge(&self, account_id: AccountId, command: &str) -> Result<Charge, ChaddiError> {
        let Some(cost) = self.cost_of(command) else {
            return Ok(Charge::Free);
        };
        if paywall(&self.db, account_id, cost).await? {
            info!(account_id = account_id.0, command, cost, "command paid");
            Ok(Charge::Paid(cost))
        } else {
            debug!(account_id = account_id.0, command, cost, "paywall refused");
            Ok(Charge::Refused {
                message: insufficient_message(command, cost),
            })
        }
    }
}
