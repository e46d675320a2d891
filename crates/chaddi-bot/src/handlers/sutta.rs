// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/sutta`: a cigarette that burns down by editing its own message.
//!
//! The burn progress lives in the smoker's metadata, so a second sutta is
//! refused until the first one is finished.

use std::sync::Arc;
use std::time::Duration;

use chaddi_core::{AccountId, ChaddiError, ChatEvent, ChatId, ChatPlatform, MessageId, Sender};
use chaddi_scheduler::JobControl;
use chaddi_storage::Database;
use chaddi_storage::queries::accounts;
use tracing::{debug, error, info};

use super::Reply;
use crate::context::BotContext;

pub const STILL_BURNING: &str = "DHUMRAPAN SEHAT KE LIYE HANIKARAK HAI! 💀";
pub const LIGHTING: &str = "<code>~~ Ek minute... lighter kidhar hai... ~~</code>";
pub const ASH: &str = "~~~";

/// Frames drawn before the sutta turns to ash.
const LAST_FRAME: u32 = 8;
const TICK: Duration = Duration::from_secs(3);

/// The cigarette after `iteration` puffs.
pub fn frame(iteration: u32) -> String {
    let remaining = LAST_FRAME.saturating_sub(iteration) as usize;
    format!("(̅_̅_̅_̅(̅_̅{}_̅()ڪے", "_̅".repeat(remaining))
}

pub fn job_name(chat_id: ChatId, account_id: AccountId) -> String {
    format!("sutta/{}/{}", chat_id.0, account_id.0)
}

pub async fn handle(
    ctx: &BotContext,
    event: &ChatEvent,
    sender: &Sender,
) -> Result<Reply, ChaddiError> {
    let (_, lit) = accounts::update_account(&ctx.db, sender.id, |account| {
        if account.metadata.sutta_progress().is_some() {
            return false;
        }
        account.metadata.set_sutta_progress(Some(0));
        true
    })
    .await?
    .ok_or_else(|| ChaddiError::not_found("account", sender.id))?;
    if !lit {
        debug!(account_id = sender.id.0, "sutta already burning");
        return Ok(Reply::text(STILL_BURNING));
    }

    let chat_id = event.chat.id;
    let message_id = match ctx
        .platform
        .send_text(chat_id, LIGHTING, Some(event.message_id))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            extinguish(&ctx.db, sender.id).await?;
            return Err(e);
        }
    };

    let db = ctx.db.clone();
    let platform = Arc::clone(&ctx.platform);
    let account_id = sender.id;
    ctx.queue
        .run_repeating(job_name(chat_id, account_id), Duration::ZERO, TICK, move || {
            let db = db.clone();
            let platform = Arc::clone(&platform);
            async move {
                match puff(&db, platform.as_ref(), account_id, chat_id, message_id).await {
                    Ok(control) => control,
                    Err(e) => {
                        error!(account_id = account_id.0, error = %e, "sutta tick failed");
                        if let Err(e) = extinguish(&db, account_id).await {
                            error!(account_id = account_id.0, error = %e, "failed to clear sutta");
                        }
                        JobControl::Stop
                    }
                }
            }
        });
    info!(chat_id = chat_id.0, account_id = account_id.0, "sutta lit");
    Ok(Reply::Nothing)
}

/// One tick: draw the current frame, or the ash once the last frame is done.
async fn puff(
    db: &Database,
    platform: &dyn ChatPlatform,
    account_id: AccountId,
    chat_id: ChatId,
    message_id: MessageId,
) -> Result<JobControl, ChaddiError> {
    let (_, iteration) = accounts::update_account(db, account_id, |account| {
        let current = account.metadata.sutta_progress().unwrap_or(0);
        if current <= LAST_FRAME {
            account.metadata.set_sutta_progress(Some(current + 1));
        }
        current
    })
    .await?
    .ok_or_else(|| ChaddiError::not_found("account", account_id))?;

    if iteration <= LAST_FRAME {
        platform
            .edit_text(chat_id, message_id, &frame(iteration))
            .await?;
        return Ok(JobControl::Continue);
    }
    platform.edit_text(chat_id, message_id, ASH).await?;
    extinguish(db, account_id).await?;
    debug!(account_id = account_id.0, "sutta finished");
    Ok(JobControl::Stop)
}

async fn extinguish(db: &Database, account_id: AccountId) -> Result<(), ChaddiError> {
    accounts::update_account(db, account_id, |account| {
        account.metadata.set_sutta_progress(None)
    })
    .await?;
    Ok(())
}
