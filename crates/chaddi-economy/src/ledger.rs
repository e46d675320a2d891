// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rokda ledger: lazy account creation, activity sync and rewards.
//!
//! Every observed chat event refreshes the sender's profile, keeps group
//! membership current and logs the message. Plain chat activity also earns
//! one [`reward`]; commands do not.

use chaddi_core::{
    Account, AccountId, ChaddiError, ChatEvent, EventPayload, Sender, text::round2,
};
use chaddi_storage::queries::{accounts, activity, groups};
use chaddi_storage::{Database, MessageRecord};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Concave activity reward: poorer accounts earn more per tick.
///
/// Negative or non-finite balances are treated as zero first.
pub fn reward(balance: f64) -> f64 {
    let balance = if balance.is_finite() && balance > 0.0 {
        balance
    } else {
        0.0
    };
    round2(balance + 100.0 / (balance + 10.0) + 1.0)
}

/// What kind of activity an observed event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Ordinary chat: earns a reward tick.
    Chat,
    /// A command for this bot: synced, never rewarded.
    Command,
}

/// Account and membership bookkeeping over the database.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    starting_balance: f64,
}

impl Ledger {
    pub fn new(db: Database, starting_balance: f64) -> Self {
        Self {
            db,
            starting_balance,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The account for `sender`, created with the starting balance if unseen.
    ///
    /// Refreshes the stored username and display name.
    pub async fn get_or_create(
        &self,
        sender: &Sender,
        now: DateTime<Utc>,
    ) -> Result<Account, ChaddiError> {
        let candidate = Account::new(
            sender.id,
            sender.username.clone(),
            sender.display_name(),
            self.starting_balance,
            now,
        );
        let (account, created) = accounts::upsert_profile(&self.db, candidate, now).await?;
        if created {
            info!(
                account_id = account.id.0,
                balance = account.balance,
                "created account"
            );
        }
        Ok(account)
    }

    /// Look up an account by id.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, ChaddiError> {
        accounts::get_account(&self.db, id).await
    }

    /// Look up an account by username (with or without `@`).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, ChaddiError> {
        accounts::find_by_username(&self.db, username).await
    }

    /// Sync persisted state with one inbound event.
    ///
    /// Returns the sender's account (after the reward for [`Activity::Chat`]),
    /// or `None` for events without a sender.
    pub async fn observe(
        &self,
        event: &ChatEvent,
        activity: Activity,
    ) -> Result<Option<Account>, ChaddiError> {
        let now = event.received_at;

        if let Some(group_id) = event.group_id() {
            groups::upsert_group(
                &self.db,
                group_id,
                event.chat.title.clone(),
                event.chat.kind,
                now,
            )
            .await?;

            match &event.payload {
                EventPayload::MembersJoined(members) => {
                    for member in members {
                        self.get_or_create(member, now).await?;
                        if groups::add_member(&self.db, group_id, member.id, now).await? {
                            info!(group_id = group_id.0, account_id = member.id.0, "member joined");
                        }
                    }
                }
                EventPayload::MemberLeft(member) => {
                    if groups::remove_member(&self.db, group_id, member.id).await? {
                        info!(group_id = group_id.0, account_id = member.id.0, "member left");
                    }
                }
                _ => {}
            }
        }

        let Some(sender) = &event.sender else {
            return Ok(None);
        };
        let account = self.get_or_create(sender, now).await?;

        if let Some(group_id) = event.group_id() {
            let left = matches!(&event.payload, EventPayload::MemberLeft(m) if m.id == sender.id);
            if !left && groups::add_member(&self.db, group_id, sender.id, now).await? {
                debug!(group_id = group_id.0, account_id = sender.id.0, "tracking new member");
            }
        }

        activity::record_message(
            &self.db,
            &MessageRecord {
                chat_id: event.chat.id,
                message_id: event.message_id,
                from_id: Some(sender.id),
                text: event.text().map(str::to_string),
                sent_at: now,
            },
        )
        .await?;

        if activity == Activity::Command {
            return Ok(Some(account));
        }
        let rewarded = accounts::update_account(&self.db, sender.id, |account| {
            account.balance = reward(account.balance);
        })
        .await?;
        Ok(rewarded.map(|(account, ())| account))
    }
}
