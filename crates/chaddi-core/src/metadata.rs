// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed account and group metadata.
//!
//! Accounts carry cooldown markers and roll effects as a list of
//! [`Modifier`]s. On disk the metadata is a flat JSON object using the
//! legacy keys (`censored`, `auto_mom`, `last_time_gambled`,
//! `last_time_rolled`, `sutta_ittr`) so rows written by older deployments
//! still load. Unknown keys are carried through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A roll effect that can be applied to an account within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    /// Every message the account sends in the group is deleted.
    Muted,
    /// Every message the account sends in the group gets an insult reply.
    AutoInsult,
}

/// One piece of state attached to an account.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Muted { group_ids: Vec<i64> },
    AutoInsult { group_ids: Vec<i64> },
    LastGambled { at: DateTime<Utc> },
    LastRolled { at: DateTime<Utc> },
    SuttaProgress { iteration: u32 },
}

/// Typed metadata of an [`Account`](crate::models::Account).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAccountMetadata", into = "RawAccountMetadata")]
pub struct AccountMetadata {
    modifiers: Vec<Modifier>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl AccountMetadata {
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn last_gambled(&self) -> Option<DateTime<Utc>> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::LastGambled { at } => Some(*at),
            _ => None,
        })
    }

    pub fn set_last_gambled(&mut self, at: DateTime<Utc>) {
        self.modifiers
            .retain(|m| !matches!(m, Modifier::LastGambled { .. }));
        self.modifiers.push(Modifier::LastGambled { at });
    }

    pub fn last_rolled(&self) -> Option<DateTime<Utc>> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::LastRolled { at } => Some(*at),
            _ => None,
        })
    }

    pub fn set_last_rolled(&mut self, at: DateTime<Utc>) {
        self.modifiers
            .retain(|m| !matches!(m, Modifier::LastRolled { .. }));
        self.modifiers.push(Modifier::LastRolled { at });
    }

    pub fn sutta_progress(&self) -> Option<u32> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::SuttaProgress { iteration } => Some(*iteration),
            _ => None,
        })
    }

    /// Sets or clears the sutta burn progress.
    pub fn set_sutta_progress(&mut self, iteration: Option<u32>) {
        self.modifiers
            .retain(|m| !matches!(m, Modifier::SuttaProgress { .. }));
        if let Some(iteration) = iteration {
            self.modifiers.push(Modifier::SuttaProgress { iteration });
        }
    }

    /// Groups in which `kind` is active for this account.
    pub fn effect_groups(&self, kind: EffectKind) -> &[i64] {
        self.modifiers
            .iter()
            .find_map(|m| match (kind, m) {
                (EffectKind::Muted, Modifier::Muted { group_ids })
                | (EffectKind::AutoInsult, Modifier::AutoInsult { group_ids }) => {
                    Some(group_ids.as_slice())
                }
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn has_effect(&self, kind: EffectKind, group_id: i64) -> bool {
        self.effect_groups(kind).contains(&group_id)
    }

    /// Adds `group_id` to the effect list. Returns `false` if it was already there.
    pub fn add_effect(&mut self, kind: EffectKind, group_id: i64) -> bool {
        if self.has_effect(kind, group_id) {
            return false;
        }
        match self.effect_list_mut(kind) {
            Some(ids) => ids.push(group_id),
            None => self.modifiers.push(match kind {
                EffectKind::Muted => Modifier::Muted {
                    group_ids: vec![group_id],
                },
                EffectKind::AutoInsult => Modifier::AutoInsult {
                    group_ids: vec![group_id],
                },
            }),
        }
        true
    }

    /// Removes `group_id` from the effect list. Absent ids are not an error.
    pub fn remove_effect(&mut self, kind: EffectKind, group_id: i64) -> bool {
        match self.effect_list_mut(kind) {
            Some(ids) => {
                let before = ids.len();
                ids.retain(|id| *id != group_id);
                before != ids.len()
            }
            None => false,
        }
    }

    fn effect_list_mut(&mut self, kind: EffectKind) -> Option<&mut Vec<i64>> {
        self.modifiers.iter_mut().find_map(|m| match (kind, m) {
            (EffectKind::Muted, Modifier::Muted { group_ids })
            | (EffectKind::AutoInsult, Modifier::AutoInsult { group_ids }) => Some(group_ids),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GroupIds {
    #[serde(default)]
    group_ids: Vec<i64>,
}

/// On-disk shape of account metadata.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawAccountMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    censored: Option<GroupIds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_mom: Option<GroupIds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_time_gambled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_time_rolled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sutta_ittr: Option<u32>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

/// Parses RFC 3339, or a naive ISO timestamp (treated as UTC) as written by
/// older deployments.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

impl From<RawAccountMetadata> for AccountMetadata {
    fn from(raw: RawAccountMetadata) -> Self {
        let mut modifiers = Vec::new();
        if let Some(ids) = raw.censored {
            modifiers.push(Modifier::Muted {
                group_ids: ids.group_ids,
            });
        }
        if let Some(ids) = raw.auto_mom {
            modifiers.push(Modifier::AutoInsult {
                group_ids: ids.group_ids,
            });
        }
        if let Some(at) = raw.last_time_gambled.as_deref().and_then(parse_timestamp) {
            modifiers.push(Modifier::LastGambled { at });
        }
        if let Some(at) = raw.last_time_rolled.as_deref().and_then(parse_timestamp) {
            modifiers.push(Modifier::LastRolled { at });
        }
        if let Some(iteration) = raw.sutta_ittr {
            modifiers.push(Modifier::SuttaProgress { iteration });
        }
        Self {
            modifiers,
            extra: raw.extra,
        }
    }
}

impl From<AccountMetadata> for RawAccountMetadata {
    fn from(meta: AccountMetadata) -> Self {
        let mut raw = RawAccountMetadata {
            extra: meta.extra,
            ..Default::default()
        };
        for modifier in meta.modifiers {
            match modifier {
                Modifier::Muted { group_ids } => raw.censored = Some(GroupIds { group_ids }),
                Modifier::AutoInsult { group_ids } => {
                    raw.auto_mom = Some(GroupIds { group_ids })
                }
                Modifier::LastGambled { at } => raw.last_time_gambled = Some(at.to_rfc3339()),
                Modifier::LastRolled { at } => raw.last_time_rolled = Some(at.to_rfc3339()),
                Modifier::SuttaProgress { iteration } => raw.sutta_ittr = Some(iteration),
            }
        }
        raw
    }
}

/// Per-group feature toggles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMetadata {
    /// Commands (without the leading `/`) that are silently ignored in this group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_commands: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GroupMetadata {
    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands.iter().any(|c| c == command)
    }
}
