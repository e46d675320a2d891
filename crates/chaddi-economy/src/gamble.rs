// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `/gamble` payout table.
//!
//! A single uniform draw in `[0, 1)` selects one of fourteen bands, checked
//! from the highest threshold down. Some bands move rokda to or from a
//! random other member of the group.

use chaddi_core::{
    Account, AccountId, ChaddiError, ChatId,
    text::{ROKDA, escape_html},
};
use chaddi_storage::Database;
use chaddi_storage::queries::{accounts, groups};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use strum::Display;
use tracing::info;

/// Reply when the account gambled too recently.
pub const COOLDOWN_MESSAGE: &str = "This is becoming an addiction for you... Come back later!";

/// Suffix appended when a band leaves the account below zero.
pub const BANKRUPT_SUFFIX: &str =
    " You're bankrupt with 0 ₹okda, enroll into ChaddiInc Narega!";

/// One payout band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GambleOutcome {
    Jackpot,
    BigWin,
    Ballin,
    WinAndGift,
    GoodWin,
    SmallWin,
    Pity,
    Tip,
    EntryFee,
    Chalan,
    Mugged,
    Raid,
    Ruin,
    Nothing,
}

impl GambleOutcome {
    /// Map a draw in `[0, 1)` to its band.
    pub fn from_draw(draw: f64) -> Self {
        if draw > 0.98 {
            Self::Jackpot
        } else if draw > 0.95 {
            Self::BigWin
        } else if draw > 0.90 {
            Self::Ballin
        } else if draw > 0.85 {
            Self::WinAndGift
        } else if draw > 0.75 {
            Self::GoodWin
        } else if draw > 0.65 {
            Self::SmallWin
        } else if draw > 0.55 {
            Self::Pity
        } else if draw > 0.45 {
            Self::Tip
        } else if draw > 0.35 {
            Self::EntryFee
        } else if draw > 0.25 {
            Self::Chalan
        } else if draw > 0.15 {
            Self::Mugged
        } else if draw > 0.01 {
            Self::Raid
        } else if draw > 0.001 {
            Self::Ruin
        } else {
            Self::Nothing
        }
    }

    /// Apply the band to the gambler's balance and the other member's, if any.
    fn apply(self, me: &mut f64, other: Option<&mut f64>) {
        let (mine, theirs) = match self {
            Self::Jackpot => (500.0, 0.0),
            Self::BigWin => (400.0, 0.0),
            Self::Ballin => (300.0, 0.0),
            Self::WinAndGift => (200.0, 15.0),
            Self::GoodWin => (100.0, 0.0),
            Self::SmallWin => (50.0, 0.0),
            Self::Pity => (1.0, 0.0),
            Self::Tip => (-100.0, 100.0),
            Self::EntryFee => (-250.0, 0.0),
            Self::Chalan => (-375.0, 0.0),
            Self::Mugged => (-500.0, 500.0),
            Self::Raid => (-1000.0, 0.0),
            Self::Ruin => {
                if let Some(other) = other {
                    *other += *me;
                }
                *me = 1.0;
                return;
            }
            Self::Nothing => (0.0, 0.0),
        };
        *me += mine;
        if let Some(other) = other {
            *other += theirs;
        }
    }

    /// Reply text. `other` is the other member's display name.
    pub fn message(self, other: &str) -> String {
        match self {
            Self::Jackpot => format!("HOLY CRAP! You won! +500 {ROKDA}"),
            Self::BigWin => format!("OMG! You won! +400 {ROKDA}"),
            Self::Ballin => format!("You ballin now fam. just won 300 {ROKDA}"),
            Self::WinAndGift => format!("You won 200 {ROKDA} and gifted 15 to {other}"),
            Self::GoodWin => format!("You won +100 {ROKDA}... this is pretty good tbh!"),
            Self::SmallWin => format!("Boond boond se sagar banta... You won! +50 {ROKDA}"),
            Self::Pity => format!(
                "Your wallet got stolen in the local train, good thing {ROKDA} are digital. \
                 Take +1 {ROKDA} in pity"
            ),
            Self::Tip => format!("{other} brought you chai and you tipped him 100 {ROKDA}"),
            Self::EntryFee => {
                format!("No win / no loss... but you still paid entry fee of 250 {ROKDA}!")
            }
            Self::Chalan => format!(
                "You got drunk at the bar and drove back home... and also got a chalan of \
                 375 {ROKDA}"
            ),
            Self::Mugged => format!(
                "You actually won... but while leaving the casino you got mugged by {other} \
                 and lost 500 {ROKDA}!"
            ),
            Self::Raid => {
                "CBI Raided ChaddiInc... That 1000 you just won was derokdatized!".to_string()
            }
            Self::Ruin => format!(
                "You lost your entire fortune (and Paul's Kwid) to {other}. Gambling can suck!"
            ),
            Self::Nothing => "The casino is closed today. Nothing happened!".to_string(),
        }
    }
}

/// Preconditions for gambling.
#[derive(Debug, Clone, Copy)]
pub struct GambleRules {
    pub cooldown: Duration,
    pub min_balance: f64,
}

/// Why an account may not gamble right now, or `None` if it may.
///
/// The cooldown takes precedence over the balance check.
pub fn can_gamble(account: &Account, rules: &GambleRules, now: DateTime<Utc>) -> Option<String> {
    if let Some(last) = account.metadata.last_gambled() {
        if last > now - rules.cooldown {
            return Some(COOLDOWN_MESSAGE.to_string());
        }
    }
    if account.balance < rules.min_balance {
        return Some(format!(
            "Sorry you need atleast {} {ROKDA} to gamble! Come back later...",
            chaddi_core::text::format_rokda(rules.min_balance)
        ));
    }
    None
}

/// Result of one gamble.
#[derive(Debug, Clone, PartialEq)]
pub enum GambleResult {
    /// Preconditions failed; balances are untouched.
    Refused(String),
    /// The gamble happened.
    Played {
        outcome: GambleOutcome,
        text: String,
        account: Account,
        other: Option<Account>,
    },
}

/// Pick a random member of `group_id` other than `exclude`.
pub async fn random_other_member(
    db: &Database,
    group_id: ChatId,
    exclude: AccountId,
) -> Result<Option<Account>, ChaddiError> {
    let members: Vec<Account> = groups::list_members(db, group_id)
        .await?
        .into_iter()
        .filter(|a| a.id != exclude)
        .collect();
    Ok(members.choose(&mut rand::thread_rng()).cloned())
}

/// Gamble with a fresh random draw.
pub async fn gamble(
    db: &Database,
    account_id: AccountId,
    group_id: Option<ChatId>,
    rules: GambleRules,
    now: DateTime<Utc>,
) -> Result<GambleResult, ChaddiError> {
    let draw = rand::thread_rng().gen_range(0.0..1.0);
    gamble_with_draw(db, account_id, group_id, rules, now, draw).await
}

/// Gamble with a given draw.
///
/// The precondition check, the band and the "last gambled" marker are
/// applied in one read-modify-write, so two concurrent gambles cannot both
/// pass the cooldown.
pub async fn gamble_with_draw(
    db: &Database,
    account_id: AccountId,
    group_id: Option<ChatId>,
    rules: GambleRules,
    now: DateTime<Utc>,
    draw: f64,
) -> Result<GambleResult, ChaddiError> {
    let outcome = GambleOutcome::from_draw(draw);
    let other = match group_id {
        Some(group_id) => random_other_member(db, group_id, account_id).await?,
        None => None,
    };
    let other_name = other
        .as_ref()
        .map_or_else(|| "someone".to_string(), |o| escape_html(&o.pretty_name()));

    // Ok(bankrupt) when played, Err(reply) when refused.
    let play = move |me: &mut Account, other: Option<&mut Account>| -> Result<bool, String> {
        if let Some(refusal) = can_gamble(me, &rules, now) {
            return Err(refusal);
        }
        outcome.apply(&mut me.balance, other.map(|o| &mut o.balance));
        me.metadata.set_last_gambled(now);
        let bankrupt = me.balance < 0.0;
        if bankrupt {
            me.balance = 0.0;
        }
        Ok(bankrupt)
    };

    let (account, other, played) = match other {
        Some(other) => {
            let (me, them, played) =
                accounts::update_account_pair(db, account_id, other.id, move |me, them| {
                    play(me, Some(them))
                })
                .await?
                .ok_or_else(|| ChaddiError::not_found("account", account_id))?;
            (me, Some(them), played)
        }
        None => {
            let (me, played) = accounts::update_account(db, account_id, move |me| play(me, None))
                .await?
                .ok_or_else(|| ChaddiError::not_found("account", account_id))?;
            (me, None, played)
        }
    };

    let bankrupt = match played {
        Ok(bankrupt) => bankrupt,
        Err(refusal) => return Ok(GambleResult::Refused(refusal)),
    };
    let mut text = outcome.message(&other_name);
    if bankrupt {
        text.push_str(BANKRUPT_SUFFIX);
    }

    info!(
        account_id = account_id.0,
        outcome = %outcome,
        balance = account.balance,
        other_id = other.as_ref().map(|o| o.id.0),
        "gambled"
    );
    Ok(GambleResult::Played {
        outcome,
        text,
        account,
        other,
    })
}
