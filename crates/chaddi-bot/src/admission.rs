// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command admission: rate limit, per-group toggles and the paywall.

use std::sync::Arc;
use std::time::Duration;

use chaddi_core::{AccountId, ChaddiError, ChatEvent};
use chaddi_economy::Charge;
use chaddi_storage::queries::groups;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::command::{BotCommand, Command};
use crate::context::BotContext;

/// At most one command per account per `window`.
#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    last_seen: Arc<DashMap<AccountId, Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Arc::new(DashMap::new()),
        }
    }

    /// Records a command from `account_id` and returns whether it may run.
    pub fn check(&self, account_id: AccountId) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let now = Instant::now();
        let mut allowed = true;
        self.last_seen
            .entry(account_id)
            .and_modify(|last| {
                if now.duration_since(*last) < self.window {
                    allowed = false;
                } else {
                    *last = now;
                }
            })
            .or_insert(now);
        allowed
    }
}

/// What to do with a parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Run,
    /// Silently ignored.
    Drop,
    /// Not run; the text is sent as a reply.
    Deny(String),
}

/// Decide whether `command` from `event` may run, charging for paid commands.
///
/// The charge is the last step, so a dropped command never costs anything.
pub async fn admit(
    ctx: &BotContext,
    event: &ChatEvent,
    account_id: AccountId,
    command: &Command,
) -> Result<Admission, ChaddiError> {
    let name = command.command.name();

    if !ctx.rate_limiter.check(account_id) {
        debug!(account_id = account_id.0, command = name, "rate limited");
        return Ok(Admission::Drop);
    }

    if let Some(group_id) = event.group_id()
        && command.command != BotCommand::Toggle
        && let Some(group) = groups::get_group(&ctx.db, group_id).await?
        && group.metadata.is_disabled(name)
    {
        debug!(group_id = group_id.0, command = name, "command disabled in group");
        return Ok(Admission::Drop);
    }

    match ctx.paywall.charge(account_id, name).await? {
        Charge::Free | Charge::Paid(_) => Ok(Admission::Run),
        Charge::Refused { message } => Ok(Admission::Deny(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_command_within_window_is_dropped() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        assert!(limiter.check(AccountId(1)));
        assert!(!limiter.check(AccountId(1)));
        assert!(limiter.check(AccountId(2)));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(limiter.check(AccountId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_commands_do_not_extend_the_window() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        assert!(limiter.check(AccountId(1)));
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!limiter.check(AccountId(1)));
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.check(AccountId(1)));
    }

    #[test]
    fn zero_window_never_limits() {
        let limiter = RateLimiter::new(Duration::ZERO);
        assert!(limiter.check(AccountId(1)));
        assert!(limiter.check(AccountId(1)));
    }
}
