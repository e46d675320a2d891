// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat texts for the roulette.

use chaddi_core::text::{ROKDA, escape_html, format_rokda, pretty_time_delta};
use chaddi_core::{Roll, RollRule};
use chrono::{DateTime, Utc};

pub const NO_ACTIVE_ROLL: &str =
    "No active roulette right now. <code>/roll start</code> to start one!";
pub const GROUP_ONLY: &str = "Roll can only be used in a group!";
pub const REFUSED: &str = "Chal kat re bsdk!";
pub const START_FAILED: &str = "Couldn't start a new roll :(";
pub const ROLL_COOLDOWN: &str = "You can only roll once every 5 mins... Ignoring this roll!";
pub const KICK_FAILED: &str =
    "Looks like I'm not able to kick user... Please check the Group permissions!";

/// Announcement for a freshly started roll, also used by `/roll` status.
pub fn started(description: &str) -> String {
    format!("<b>Started new roulette!</b> {description}")
}

/// Reply to the winning dice.
pub fn winrar(description: &str) -> String {
    format!("<b>WINRAR!!!</b> {description}")
}

pub fn goodbye(victim: &str) -> String {
    format!("BYEEEEEEEEEEEE {}", escape_html(victim))
}

pub fn modifiers_removed(victim: &str) -> String {
    format!("Roll Modifiers for {} are now removed!", escape_html(victim))
}

/// Describes a roll for the chat.
///
/// An open roll lists the goal and prize. A won roll names the winner and,
/// unless the victim was kicked, how long the effect still lasts.
pub fn describe(roll: &Roll, victim: &str, winner: Option<&str>, now: DateTime<Utc>) -> String {
    let victim = escape_html(victim);
    let verb = roll.rule.verb();
    let prize = format_rokda(roll.prize);
    match winner {
        None => format!(
            "\nRoll a {goal} to {verb} {victim}!\n\n\
             <b>Rules:</b>\n\
             - Roll a <b>{goal}</b> by posting a 🎲  <pre>:dice:</pre>\n\
             - Only one roll per 5 mins\n\n\
             <b>Prizes:</b>\n\
             - {victim} gets {verb}'d\n\
             - 💵 YOU WIN {prize} {ROKDA} 🎉\n",
            goal = roll.goal,
        ),
        Some(winner) => {
            let winner = escape_html(winner);
            let effect = if roll.rule == RollRule::KickUser {
                format!("- 👋 {victim} has been kicked from this group!")
            } else {
                let left = (roll.expiry - now).num_seconds().max(0);
                format!("- 🤪 {victim} is now {verb} for {}!", pretty_time_delta(left))
            };
            format!(
                "\n{winner} won the current roll by rolling a {goal}!\n\n\
                 {effect}\n\
                 - 💵 {winner} received {prize}{ROKDA}!\n",
                goal = roll.goal,
            )
        }
    }
}
