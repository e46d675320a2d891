// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/toggle <command>`: admins switch a command off or on for one group.

use std::str::FromStr;

use chaddi_core::{ChaddiError, ChatEvent, Sender};
use chaddi_storage::queries::groups;
use tracing::info;

use super::Reply;
use crate::command::{BotCommand, Command};
use crate::context::BotContext;

pub const USAGE: &str = "<b>Usage:</b> <code>/toggle gamble</code>";
pub const GROUP_ONLY: &str = "Toggle can only be used in a group!";
pub const ADMIN_ONLY: &str = "Chal kat re bsdk!";

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
    command: &Command,
) -> Result<Reply, ChaddiError> {
    let group_id = event
        .group_id()
        .ok_or_else(|| ChaddiError::InvalidInput(GROUP_ONLY.into()))?;
    if !ctx.is_admin(sender.id) {
        return Ok(Reply::text(ADMIN_ONLY));
    }
    let target = command
        .args
        .first()
        .map(|a| a.trim_start_matches('/').to_lowercase())
        .and_then(|name| BotCommand::from_str(&name).ok())
        .filter(|c| *c != BotCommand::Toggle)
        .ok_or_else(|| ChaddiError::InvalidInput(USAGE.into()))?;
    let name = target.name();

    let disabled = groups::update_group_metadata(&ctx.db, group_id, move |meta| {
        if meta.is_disabled(name) {
            meta.disabled_commands.retain(|c| c != name);
            false
        } else {
            meta.disabled_commands.push(name.to_string());
            true
        }
    })
    .await?
    .ok_or_else(|| ChaddiError::not_found("group", group_id))?;

    info!(group_id = group_id.0, command = name, disabled, "command toggled");
    let state = if disabled { "disabled" } else { "enabled" };
    Ok(Reply::Text(format!(
        "<code>/{name}</code> is now {state} in this group."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::testing::{ADMIN, Fixture, GROUP, sender_of};
    use chaddi_core::ChatId;
    use chaddi_test_utils::events;

    async fn toggle(f: &Fixture, event: &ChatEvent) -> Result<Reply, ChaddiError> {
        let command = parse_command(event.text().unwrap(), None).unwrap();
        handle(&f.ctx, event, &sender_of(event), &command).await
    }

    #[tokio::test]
    async fn admin_toggles_back_and_forth() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, ADMIN, "/toggle /Gamble");
        f.observe(&event).await;

        let reply = toggle(&f, &event).await.unwrap();
        assert_eq!(
            reply,
            Reply::text("<code>/gamble</code> is now disabled in this group.")
        );
        let group = groups::get_group(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert!(group.metadata.is_disabled("gamble"));

        toggle(&f, &event).await.unwrap();
        let group = groups::get_group(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert!(!group.metadata.is_disabled("gamble"));
    }

    #[tokio::test]
    async fn aliases_toggle_the_canonical_name() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, ADMIN, "/toggle alarm");
        f.observe(&event).await;
        toggle(&f, &event).await.unwrap();
        let group = groups::get_group(&f.ctx.db, ChatId(GROUP)).await.unwrap().unwrap();
        assert_eq!(group.metadata.disabled_commands, vec!["remind".to_string()]);
    }

    #[tokio::test]
    async fn non_admins_and_bad_targets_are_refused() {
        let f = Fixture::new().await;
        let event = events::group_text(GROUP, 1, "/toggle gamble");
        f.observe(&event).await;
        assert_eq!(toggle(&f, &event).await.unwrap(), Reply::text(ADMIN_ONLY));

        let event = events::group_text(GROUP, ADMIN, "/toggle toggle");
        f.observe(&event).await;
        let err = toggle(&f, &event).await.unwrap_err();
        assert!(matches!(err, ChaddiError::InvalidInput(ref m) if m == USAGE));
    }
}
