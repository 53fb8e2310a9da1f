//! Command-line interface definitions.
//!
//! Defines the CLI structure for bankwatch using `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bank portal transaction watcher
#[derive(Parser, Debug)]
#[command(name = "bankwatch")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and poll the portal until interrupted
    Run,

    /// Validate configuration and credentials without contacting the portal
    Check,

    /// Show retained batches, the watermark and pending transactions
    Status(StatusArgs),
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug, Default)]
pub struct StatusArgs {
    /// Show at most this many pending transactions
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::parse_from(["bankwatch", "status", "--config", "prod.toml", "--limit", "5"]);

        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        match cli.command {
            Commands::Status(args) => assert_eq!(args.limit, 5),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn defaults_to_config_toml() {
        let cli = Cli::parse_from(["bankwatch", "run"]);

        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(matches!(cli.command, Commands::Run));
        assert!(!cli.json);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["bankwatch"]).is_err());
    }
}
