// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The roulette state machine.
//!
//! A group's roll moves Absent -> Open -> Won -> Absent. Starting needs the
//! group to be Absent unless an admin forces it. The first matching dice
//! wins, applies the rule's effect to the victim and arms a rollback that
//! removes the effect and retires the roll.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chaddi_config::model::RollConfig;
use chaddi_core::{
    Account, AccountId, ChaddiError, ChatId, ChatPlatform, MessageId, Roll, RollRule, RollState,
    roll_state, text::{self, round2},
};
use chaddi_scheduler::JobQueue;
use chaddi_storage::Database;
use chaddi_storage::queries::{accounts, groups, rolls};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::describe::{self, describe};

/// Queue name of a group's pending rollback.
pub fn rollback_job_name(group_id: ChatId) -> String {
    format!("reset_roll_effects/{}", group_id.0)
}

/// Result of `/roll start`.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A new roll replaced whatever the group had. `text` announces it.
    Started { roll: Roll, text: String },
    /// A roll is live and the invoker is not an admin.
    Refused,
    /// The group has no eligible victim.
    NoVictim,
}

impl StartOutcome {
    pub fn reply(&self) -> &str {
        match self {
            StartOutcome::Started { text, .. } => text,
            StartOutcome::Refused => describe::REFUSED,
            StartOutcome::NoVictim => describe::START_FAILED,
        }
    }
}

/// Result of a dice event.
#[derive(Debug, Clone, PartialEq)]
pub enum DiceOutcome {
    /// No open roll to play against.
    Ignored,
    /// The roller is still on cooldown; the roll was not consumed.
    TooSoon,
    Miss,
    /// The roll was won and the rollback is armed.
    Won(Roll),
    /// The roll was won but the victim could not be kicked.
    KickFailed(Roll),
}

/// Owns every roll transition for all groups.
#[derive(Clone)]
pub struct RollGame {
    db: Database,
    platform: Arc<dyn ChatPlatform>,
    queue: JobQueue,
    config: RollConfig,
    bot_username: Option<String>,
}

impl RollGame {
    pub fn new(
        db: Database,
        platform: Arc<dyn ChatPlatform>,
        queue: JobQueue,
        config: RollConfig,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            db,
            platform,
            queue,
            config,
            bot_username,
        }
    }

    pub fn config(&self) -> &RollConfig {
        &self.config
    }

    fn effect_duration(&self) -> chrono::Duration {
        text::seconds(self.config.effect_duration_secs)
    }

    /// Reply to a bare `/roll`.
    pub async fn status(
        &self,
        group_id: Option<ChatId>,
        now: DateTime<Utc>,
    ) -> Result<String, ChaddiError> {
        let group_id = group_id.ok_or_else(|| ChaddiError::InvalidInput(describe::GROUP_ONLY.into()))?;
        let roll = rolls::get_roll(&self.db, group_id).await?;
        match roll {
            Some(roll) if roll.state_at(now) != RollState::Absent => {
                Ok(describe::started(&self.describe(&roll, now).await?))
            }
            _ => Ok(describe::NO_ACTIVE_ROLL.to_string()),
        }
    }

    /// `/roll start [rule] [username]`.
    ///
    /// `args` are the command arguments including `start`. An unknown rule
    /// or username falls back to a random pick.
    pub async fn start(
        &self,
        group_id: Option<ChatId>,
        args: &[String],
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, ChaddiError> {
        let group_id = group_id.ok_or_else(|| ChaddiError::InvalidInput(describe::GROUP_ONLY.into()))?;
        let current = rolls::get_roll(&self.db, group_id).await?;
        if roll_state(current.as_ref(), now) != RollState::Absent && !is_admin {
            debug!(group_id = group_id.0, "roll already live, refusing start");
            return Ok(StartOutcome::Refused);
        }

        let args: Vec<String> = args.iter().map(|a| a.to_lowercase()).collect();
        let rule = args.get(1).and_then(|r| RollRule::from_str(r).ok());
        let victim = match args.get(2) {
            Some(username) => accounts::find_by_username(&self.db, username).await?,
            None => None,
        };
        self.new_roll(group_id, rule, victim, now).await
    }

    async fn new_roll(
        &self,
        group_id: ChatId,
        rule: Option<RollRule>,
        victim: Option<Account>,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, ChaddiError> {
        let victim = match victim {
            Some(v) => Some(v),
            None => self.pick_victim(group_id).await?,
        };
        let Some(victim) = victim else {
            warn!(group_id = group_id.0, "no eligible victim for a new roll");
            return Ok(StartOutcome::NoVictim);
        };

        let (rule, goal, prize) = {
            let mut rng = rand::thread_rng();
            let rule = rule.unwrap_or_else(|| RollRule::ALL[rng.gen_range(0..RollRule::ALL.len())]);
            let (min, max) = (self.config.prize_min, self.config.prize_max);
            let prize = rng.gen_range(min..=max).round().clamp(min, max);
            (rule, rng.gen_range(1..=6u8), prize)
        };
        let roll = Roll {
            id: uuid::Uuid::new_v4().to_string(),
            group_id,
            rule,
            goal,
            victim_id: victim.id,
            winner_id: None,
            prize,
            expiry: now + self.effect_duration(),
            effect_active: false,
            created_at: now,
            updated_at: now,
        };
        self.retire_active_effects(group_id, now).await?;
        rolls::upsert_roll(&self.db, &roll).await?;
        info!(
            group_id = group_id.0,
            rule = %rule,
            goal,
            victim_id = victim.id.0,
            prize,
            "started roll"
        );

        let text = describe::started(&describe(&roll, &victim.pretty_name(), None, now));
        Ok(StartOutcome::Started { roll, text })
    }

    /// A replaced roll must not leave its victim affected, nor its pending
    /// rollback armed against the roll that replaces it.
    async fn retire_active_effects(
        &self,
        group_id: ChatId,
        now: DateTime<Utc>,
    ) -> Result<(), ChaddiError> {
        let current = rolls::get_roll(&self.db, group_id).await?;
        if !current.is_some_and(|roll| roll.effect_active) {
            return Ok(());
        }
        if self.queue.cancel_by_name(&rollback_job_name(group_id)) {
            info!(group_id = group_id.0, "cancelled rollback of replaced roll");
        }
        self.rollback(group_id, now).await?;
        Ok(())
    }

    /// Uniform draw over the group's members, never the bot itself.
    async fn pick_victim(&self, group_id: ChatId) -> Result<Option<Account>, ChaddiError> {
        let members: Vec<Account> = groups::list_members(&self.db, group_id)
            .await?
            .into_iter()
            .filter(|m| !self.is_bot(m))
            .collect();
        Ok(members.choose(&mut rand::thread_rng()).cloned())
    }

    fn is_bot(&self, account: &Account) -> bool {
        match (&self.bot_username, &account.username) {
            (Some(bot), Some(name)) => bot.trim_start_matches('@').eq_ignore_ascii_case(name),
            _ => false,
        }
    }

    /// Play a dice value against the group's roll.
    ///
    /// Replies to `message_id` on cooldown and on a win.
    pub async fn on_dice(
        &self,
        group_id: ChatId,
        roller: AccountId,
        value: u8,
        message_id: MessageId,
        now: DateTime<Utc>,
    ) -> Result<DiceOutcome, ChaddiError> {
        let Some(roll) = rolls::get_roll(&self.db, group_id).await? else {
            return Ok(DiceOutcome::Ignored);
        };
        if roll.state_at(now) != RollState::Open {
            debug!(group_id = group_id.0, "no open roll, ignoring dice");
            return Ok(DiceOutcome::Ignored);
        }

        let cooldown = text::seconds(self.config.cooldown_secs);
        let (_, allowed) = accounts::update_account(&self.db, roller, move |account| {
            if let Some(last) = account.metadata.last_rolled() {
                if last > now - cooldown {
                    return false;
                }
            }
            account.metadata.set_last_rolled(now);
            true
        })
        .await?
        .ok_or_else(|| ChaddiError::not_found("account", roller))?;
        if !allowed {
            info!(group_id = group_id.0, account_id = roller.0, "rolled too soon");
            self.platform
                .send_text(group_id, describe::ROLL_COOLDOWN, Some(message_id))
                .await?;
            return Ok(DiceOutcome::TooSoon);
        }

        if value != roll.goal {
            debug!(group_id = group_id.0, account_id = roller.0, value, "dice missed");
            return Ok(DiceOutcome::Miss);
        }

        let Some(mut won) =
            rolls::claim_win(&self.db, group_id, roller, now + self.effect_duration(), now).await?
        else {
            debug!(group_id = group_id.0, "roll was claimed first");
            return Ok(DiceOutcome::Ignored);
        };
        info!(
            group_id = group_id.0,
            winner_id = roller.0,
            goal = won.goal,
            "roll won"
        );
        let winner = accounts::update_account(&self.db, roller, {
            let prize = won.prize;
            move |account| account.balance = round2(account.balance + prize)
        })
        .await?
        .map(|(account, ())| account)
        .ok_or_else(|| ChaddiError::not_found("account", roller))?;

        let victim = match won.rule.effect() {
            Some(kind) => {
                accounts::update_account(&self.db, won.victim_id, move |account| {
                    account.metadata.add_effect(kind, group_id.0);
                })
                .await?
                .map(|(account, ())| account)
            }
            None => {
                let victim = accounts::get_account(&self.db, won.victim_id).await?;
                let name = victim
                    .as_ref()
                    .map_or_else(|| won.victim_id.to_string(), Account::pretty_name);
                self.platform
                    .send_text(group_id, &describe::goodbye(&name), None)
                    .await?;
                if let Err(e) = self.platform.kick_member(group_id, won.victim_id).await {
                    warn!(
                        group_id = group_id.0,
                        victim_id = won.victim_id.0,
                        error = %e,
                        "failed to kick roll victim"
                    );
                    self.platform
                        .send_text(group_id, describe::KICK_FAILED, None)
                        .await?;
                    return Ok(DiceOutcome::KickFailed(won));
                }
                groups::remove_member(&self.db, group_id, won.victim_id).await?;
                victim
            }
        };

        rolls::set_effect_active(&self.db, group_id, true).await?;
        won.effect_active = true;
        self.arm_rollback(group_id, self.effect_duration().to_std().unwrap_or_default());

        let victim_name = victim.map_or_else(|| won.victim_id.to_string(), |v| v.pretty_name());
        let text = describe::winrar(&describe(
            &won,
            &victim_name,
            Some(&winner.pretty_name()),
            now,
        ));
        self.platform
            .send_text(group_id, &text, Some(message_id))
            .await?;
        Ok(DiceOutcome::Won(won))
    }

    fn arm_rollback(&self, group_id: ChatId, delay: Duration) {
        let game = self.clone();
        self.queue
            .run_once(rollback_job_name(group_id), delay, async move {
                if let Err(e) = game.rollback(group_id, Utc::now()).await {
                    error!(group_id = group_id.0, error = %e, "roll rollback failed");
                }
            });
    }

    /// Admin `/roll reset`: drop any pending rollback and roll back now.
    ///
    /// Returns `false` when the invoker is not an admin.
    pub async fn reset(
        &self,
        group_id: Option<ChatId>,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, ChaddiError> {
        let group_id = group_id.ok_or_else(|| ChaddiError::InvalidInput(describe::GROUP_ONLY.into()))?;
        if !is_admin {
            return Ok(false);
        }
        if self.queue.cancel_by_name(&rollback_job_name(group_id)) {
            info!(group_id = group_id.0, "cancelled pending roll rollback");
        }
        self.rollback(group_id, now)
            .await?
            .ok_or_else(|| ChaddiError::not_found("roll", group_id))?;
        Ok(true)
    }

    /// Remove the victim's effect, retire the roll and announce it.
    ///
    /// Safe to run more than once. Returns the roll as it was, or `None`
    /// when the group never had one.
    pub async fn rollback(
        &self,
        group_id: ChatId,
        now: DateTime<Utc>,
    ) -> Result<Option<Roll>, ChaddiError> {
        let Some(roll) = rolls::retire_roll(&self.db, group_id, now).await? else {
            return Ok(None);
        };
        let victim = match roll.rule.effect() {
            Some(kind) => accounts::update_account(&self.db, roll.victim_id, move |account| {
                account.metadata.remove_effect(kind, group_id.0)
            })
            .await?
            .map(|(account, removed)| {
                if !removed {
                    debug!(group_id = group_id.0, victim_id = account.id.0, "effect already gone");
                }
                account
            }),
            None => accounts::get_account(&self.db, roll.victim_id).await?,
        };
        let name = victim.map_or_else(|| roll.victim_id.to_string(), |v| v.pretty_name());
        info!(group_id = group_id.0, victim_id = roll.victim_id.0, "roll effects reset");
        self.platform
            .send_text(group_id, &describe::modifiers_removed(&name), None)
            .await?;
        Ok(Some(roll))
    }

    /// Re-arm rollbacks of every won roll whose effect is still applied.
    ///
    /// Overdue rollbacks run immediately. Returns how many were re-armed.
    pub async fn recover(&self, now: DateTime<Utc>) -> Result<usize, ChaddiError> {
        let mut rearmed = 0;
        for roll in rolls::list_active_effects(&self.db).await? {
            match (roll.expiry - now).to_std() {
                Ok(delay) if !delay.is_zero() => {
                    self.arm_rollback(roll.group_id, delay);
                    rearmed += 1;
                }
                _ => {
                    warn!(group_id = roll.group_id.0, "rolling back overdue roll effects");
                    if let Err(e) = self.rollback(roll.group_id, now).await {
                        error!(group_id = roll.group_id.0, error = %e, "overdue rollback failed");
                    }
                }
            }
        }
        info!(rearmed, "roll recovery complete");
        Ok(rearmed)
    }

    /// Start and announce a roll in every group that has members and no
    /// live roll. Returns how many were started.
    pub async fn daily_round(&self, now: DateTime<Utc>) -> Result<usize, ChaddiError> {
        let mut started = 0;
        for group in groups::list_group_chats(&self.db).await? {
            let current = rolls::get_roll(&self.db, group.id).await?;
            if roll_state(current.as_ref(), now) != RollState::Absent {
                continue;
            }
            match self.new_roll(group.id, None, None, now).await {
                Ok(StartOutcome::Started { text, .. }) => {
                    if let Err(e) = self.platform.send_text(group.id, &text, None).await {
                        warn!(group_id = group.id.0, error = %e, "failed to announce daily roll");
                    }
                    started += 1;
                }
                Ok(_) => {}
                Err(e) => error!(group_id = group.id.0, error = %e, "daily roll failed"),
            }
        }
        info!(started, "daily roll round complete");
        Ok(started)
    }

    async fn describe(&self, roll: &Roll, now: DateTime<Utc>) -> Result<String, ChaddiError> {
        let victim = accounts::get_account(&self.db, roll.victim_id)
            .await?
            .map_or_else(|| roll.victim_id.to_string(), |v| v.pretty_name());
        let winner = match roll.winner_id {
            Some(id) => Some(
                accounts::get_account(&self.db, id)
                    .await?
                    .map_or_else(|| id.to_string(), |w| w.pretty_name()),
            ),
            None => None,
        };
        Ok(describe(roll, &victim, winner.as_deref(), now))
    }
}
