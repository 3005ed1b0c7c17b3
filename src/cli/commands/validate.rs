//! Validate config command implementation

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so a loaded file is a valid one.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Configuration validation failed");
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Request Timeout: {}s",
            config.http.request_timeout_seconds
        );
        println!("  Unknown Vendors: {:?}", config.http.unknown_vendor);
        println!(
            "  Circuit Breaker: {} failures, {}ms reset",
            config.resilience.failure_threshold, config.resilience.reset_timeout_ms
        );
        println!(
            "  Registration Retries: {} (initial delay {}ms)",
            config.resilience.max_retries, config.resilience.initial_delay_ms
        );
        println!("  Hospitals: {}", config.hospitals.len());
        for hospital in &config.hospitals {
            println!(
                "    - {} [{}] {}",
                hospital.id, hospital.vendor, hospital.base_url
            );
        }
        println!();

        Ok(EXIT_OK)
    }
}
