// EMR Gateway - vendor-agnostic EMR integration layer
// Copyright (c) 2025 EMR Gateway Contributors
// Licensed under the MIT License

use clap::Parser;
use emr_gateway::cli::{Cli, Commands, EXIT_FATAL};
use emr_gateway::config::LoggingConfig;
use emr_gateway::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Client secrets are usually supplied through .env; a missing file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for CLI runs
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let logging_config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    let guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "EMR Gateway");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Init(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Health(args) => args.execute(&cli.config).await,
        Commands::Search(args) => args.execute(&cli.config).await,
    }
}
