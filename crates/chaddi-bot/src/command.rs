// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash command parsing.

use std::str::FromStr;

use strum::{Display, EnumString};

/// Commands the bot answers. Aliases resolve to one canonical name, which is
/// also the key used for costs and per-group toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BotCommand {
    Rokda,
    Daan,
    Gamble,
    Roll,
    #[strum(
        serialize = "remind",
        serialize = "reminder",
        serialize = "remindme",
        serialize = "alarm",
        to_string = "remind"
    )]
    Remind,
    Sutta,
    Toggle,
}

impl BotCommand {
    /// The canonical command name, without `/`.
    pub fn name(self) -> &'static str {
        match self {
            BotCommand::Rokda => "rokda",
            BotCommand::Daan => "daan",
            BotCommand::Gamble => "gamble",
            BotCommand::Roll => "roll",
            BotCommand::Remind => "remind",
            BotCommand::Sutta => "sutta",
            BotCommand::Toggle => "toggle",
        }
    }
}

/// A parsed `/command arg1 arg2` message.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub command: BotCommand,
    /// The name as typed (lowercased, `@bot` suffix removed).
    pub invoked_as: String,
    pub args: Vec<String>,
    /// The whole message text.
    pub text: String,
}

/// Parse `text` as a command for this bot.
///
/// Returns `None` for plain text, unknown commands and commands addressed
/// to another bot (`/roll@other_bot`). Without a configured username every
/// `@` suffix is accepted.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix('/')?;
    let mut tokens = rest.split_whitespace();
    let head = tokens.next()?;

    let (name, target) = match head.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (head, None),
    };
    if let (Some(target), Some(me)) = (target, bot_username) {
        if !target.eq_ignore_ascii_case(me.trim_start_matches('@')) {
            return None;
        }
    }

    let invoked_as = name.to_lowercase();
    let command = BotCommand::from_str(&invoked_as).ok()?;
    Some(Command {
        command,
        invoked_as,
        args: tokens.map(str::to_string).collect(),
        text: text.to_string(),
    })
}
