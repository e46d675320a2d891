// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::metadata::{AccountMetadata, EffectKind, GroupMetadata};
use crate::types::{AccountId, ChatId, ChatKind};

/// A tracked chat participant and their ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: Option<String>,
    pub display_name: String,
    pub balance: f64,
    pub metadata: AccountMetadata,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account with the starting balance and no metadata.
    pub fn new(
        id: AccountId,
        username: Option<String>,
        display_name: String,
        starting_balance: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            display_name,
            balance: starting_balance,
            metadata: AccountMetadata::default(),
            last_seen: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Name used in chat replies: display name, else `@username`, else the id.
    pub fn pretty_name(&self) -> String {
        if !self.display_name.trim().is_empty() {
            self.display_name.clone()
        } else if let Some(u) = &self.username {
            format!("@{u}")
        } else {
            self.id.to_string()
        }
    }
}

/// A chat container the bot has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: ChatId,
    pub name: Option<String>,
    pub kind: ChatKind,
    pub metadata: GroupMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The effect a roll applies to its victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum RollRule {
    #[strum(serialize = "mute_user")]
    MuteUser,
    #[strum(serialize = "auto_mom")]
    AutoMom,
    #[strum(serialize = "kick_user")]
    KickUser,
}

impl RollRule {
    pub const ALL: [RollRule; 3] = [RollRule::MuteUser, RollRule::AutoMom, RollRule::KickUser];

    /// The verb used in "Roll a 4 to <verb> <victim>".
    pub fn verb(self) -> &'static str {
        match self {
            RollRule::MuteUser => "mute",
            RollRule::AutoMom => "/mom",
            RollRule::KickUser => "kick",
        }
    }

    /// Metadata effect backing this rule. Kick has none.
    pub fn effect(self) -> Option<EffectKind> {
        match self {
            RollRule::MuteUser => Some(EffectKind::Muted),
            RollRule::AutoMom => Some(EffectKind::AutoInsult),
            RollRule::KickUser => None,
        }
    }
}

/// Lifecycle state of a group's roll, derived from the row and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RollState {
    Absent,
    Open,
    Won,
}

/// The single roll challenge of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Roll {
    pub id: String,
    pub group_id: ChatId,
    pub rule: RollRule,
    pub goal: u8,
    pub victim_id: AccountId,
    pub winner_id: Option<AccountId>,
    pub prize: f64,
    pub expiry: DateTime<Utc>,
    /// Set while the victim effect is applied and a rollback is pending.
    pub effect_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Roll {
    pub fn state_at(&self, now: DateTime<Utc>) -> RollState {
        if self.expiry <= now {
            RollState::Absent
        } else if self.winner_id.is_none() {
            RollState::Open
        } else {
            RollState::Won
        }
    }
}

/// State of an optional roll row.
pub fn roll_state(roll: Option<&Roll>, now: DateTime<Utc>) -> RollState {
    roll.map_or(RollState::Absent, |r| r.state_at(now))
}

/// Persisted context of a reminder, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    pub chat_id: i64,
    pub from_account_id: i64,
    pub reply_to_message_id: i32,
    #[serde(default)]
    pub reminder_message: String,
    /// Absolute fire time, unix seconds.
    pub reminder_time: i64,
    pub job_id: String,
}

impl JobContext {
    /// Seconds until the job is due. Negative when overdue.
    pub fn due_in(&self, now: DateTime<Utc>) -> i64 {
        self.reminder_time - now.timestamp()
    }
}

/// A durable deferred callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJob {
    pub id: String,
    pub chat_id: ChatId,
    pub account_id: AccountId,
    /// `None` when the stored JSON could not be decoded.
    pub context: Option<JobContext>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
