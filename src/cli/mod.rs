//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the EMR gateway using clap.
//!
//! Exit codes: 0 success, 2 configuration error, 4 connection error, 5 fatal.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for a missing or invalid configuration
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when a vendor system could not be reached
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;

/// EMR Gateway - vendor-agnostic EMR integration
#[derive(Parser, Debug)]
#[command(name = "emr-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "emr-gateway.toml", env = "EMR_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EMR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Register every configured hospital and report its health
    Health(commands::health::HealthArgs),

    /// Search patients at one hospital
    Search(commands::search::SearchArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_health() {
        let cli = Cli::parse_from(["emr-gateway", "health"]);
        assert_eq!(cli.config, "emr-gateway.toml");
        assert!(matches!(cli.command, Commands::Health(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["emr-gateway", "--config", "custom.toml", "health"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["emr-gateway", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["emr-gateway", "init", "--force"]);
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_search() {
        let cli = Cli::parse_from([
            "emr-gateway",
            "search",
            "--hospital",
            "st-marys",
            "--mrn",
            "12345",
        ]);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.hospital, "st-marys");
                assert_eq!(args.mrn.as_deref(), Some("12345"));
                assert!(args.name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_search_requires_hospital() {
        assert!(Cli::try_parse_from(["emr-gateway", "search", "--name", "smith"]).is_err());
    }
}
