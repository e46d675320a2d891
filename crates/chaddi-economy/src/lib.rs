// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rokda economy: ledger, paywall, daan transfers and gambling.

pub mod gamble;
pub mod ledger;
pub mod paywall;
pub mod transfer;

pub use gamble::{GambleOutcome, GambleResult, GambleRules, can_gamble, gamble};
pub use ledger::{Activity, Ledger, reward};
pub use paywall::{Charge, Paywall, insufficient_message, paywall};
pub use transfer::{DaanAmount, TransferOutcome, parse_daan_amount, transfer};
