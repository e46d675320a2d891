// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chaddi - a Telegram group bot with an economy, roulette and reminders.
//!
//! This is the binary entry point.

mod serve;

use std::path::{Path, PathBuf};

use chaddi_config::{ChaddiConfig, ConfigError};
use clap::{Parser, Subcommand};

/// Chaddi - a Telegram group bot.
#[derive(Parser, Debug)]
#[command(name = "chaddi", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Telegram and serve until interrupted.
    Serve,
    /// Manage Chaddi configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, then exit.
    Check,
}

fn load(path: Option<&Path>) -> Result<ChaddiConfig, Vec<ConfigError>> {
    match path {
        Some(path) => chaddi_config::load_and_validate_path(path),
        None => chaddi_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            chaddi_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            println!(
                "chaddi: config ok (bot.name={}, storage.database_path={})",
                config.bot.name, config.storage.database_path
            );
        }
        None => {
            println!("chaddi: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_config_check_with_path() {
        let cli = Cli::parse_from(["chaddi", "--config", "/tmp/c.toml", "config", "check"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaddi.toml");
        std::fs::write(&path, "[bot]\nname = \"testbot\"\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.bot.name, "testbot");
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaddi.toml");
        std::fs::write(&path, "[bot]\nnmae = \"typo\"\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }
}
