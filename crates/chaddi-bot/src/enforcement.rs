// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies roll effects to live chat: muted members lose their messages,
//! auto-insulted members get a reply to each one.

use chaddi_core::{ChaddiError, ChatEvent, EffectKind, EventPayload};
use chaddi_storage::queries::accounts;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::context::BotContext;

const INSULTS: &[&str] = &[
    "Your mom called. She wants her phone back.",
    "Tumhari mummy ko sab pata hai.",
    "Your mom still thinks you're studying right now.",
    "Your mom is very proud of you. Just kidding!",
    "Ghar jaake mummy ko yahi bolke dikha.",
];

/// What enforcement did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep processing the event.
    Continue,
    /// The message was removed; stop here.
    Removed,
}

/// Enforce the sender's active effects in this group.
pub async fn enforce(ctx: &BotContext, event: &ChatEvent) -> Result<Verdict, ChaddiError> {
    let (Some(group_id), Some(sender)) = (event.group_id(), event.sender.as_ref()) else {
        return Ok(Verdict::Continue);
    };
    if matches!(
        event.payload,
        EventPayload::MembersJoined(_) | EventPayload::MemberLeft(_)
    ) {
        return Ok(Verdict::Continue);
    }
    let Some(account) = accounts::get_account(&ctx.db, sender.id).await? else {
        return Ok(Verdict::Continue);
    };

    if account.metadata.has_effect(EffectKind::Muted, group_id.0) {
        debug!(group_id = group_id.0, account_id = sender.id.0, "deleting muted message");
        match ctx.platform.delete_message(group_id, event.message_id).await {
            Ok(()) => {}
            Err(e @ ChaddiError::PermissionDenied { .. }) => {
                warn!(group_id = group_id.0, error = %e, "cannot delete muted message");
            }
            Err(e) => return Err(e),
        }
        return Ok(Verdict::Removed);
    }

    if account.metadata.has_effect(EffectKind::AutoInsult, group_id.0) {
        let insult = INSULTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(INSULTS[0]);
        ctx.platform
            .send_text(group_id, insult, Some(event.message_id))
            .await?;
    }
    Ok(Verdict::Continue)
}
