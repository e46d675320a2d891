// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chaddi.toml` > `~/.config/chaddi/chaddi.toml` > `/etc/chaddi/chaddi.toml`
//! with environment variable overrides via `CHADDI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChaddiConfig;

/// Top-level sections, in the order env keys are matched against.
const SECTIONS: &[&str] = &["bot", "telegram", "storage", "economy", "roll", "reminder"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chaddi/chaddi.toml` (system-wide)
/// 3. `~/.config/chaddi/chaddi.toml` (user XDG config)
/// 4. `./chaddi.toml` (local directory)
/// 5. `CHADDI_*` environment variables
pub fn load_config() -> Result<ChaddiConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ChaddiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChaddiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChaddiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChaddiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChaddiConfig::default()))
        .merge(Toml::file("/etc/chaddi/chaddi.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chaddi/chaddi.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chaddi.toml"))
        .merge(env_provider())
}

/// Maps `CHADDI_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after the section name becomes a dot, so
/// `CHADDI_TELEGRAM_BOT_TOKEN` is `telegram.bot_token`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("CHADDI_").map(|key| map_env_key(key.as_str()).into())
}
