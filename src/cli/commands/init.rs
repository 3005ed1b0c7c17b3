//! Init command implementation
//!
//! Writes a sample configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "emr-gateway.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing EMR gateway configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your hospitals", self.output);
                println!("  2. Put client secrets in a .env file:");
                println!("     ST_MARYS_CLIENT_SECRET=...");
                println!("  3. Validate configuration: emr-gateway validate-config");
                println!("  4. Check connectivity: emr-gateway health");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

/// Sample configuration with every section and its defaults
pub fn sample_config() -> &'static str {
    r#"# EMR Gateway Configuration

# development | staging | production (production requires https base URLs)
environment = "development"

[application]
log_level = "info"

[http]
request_timeout_seconds = 30
connect_timeout_seconds = 10
# Successful probes slower than this report "degraded"
degraded_latency_ms = 2000
# reject | epic
unknown_vendor = "reject"

[resilience]
failure_threshold = 5
reset_timeout_ms = 30000
# Retries apply to hospital registration only
max_retries = 3
initial_delay_ms = 1000

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"

[[hospitals]]
id = "st-marys"
vendor = "cerner"
base_url = "https://fhir.example"
client_id = "c1"
client_secret = "${ST_MARYS_CLIENT_SECRET}"
scopes = ["system/Patient.read", "system/DiagnosticReport.read", "system/ServiceRequest.write"]
# tenant_id = "ec2458f2-1e24-41c8-b71b-0e701af7583d"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_parses() {
        std::env::set_var("ST_MARYS_CLIENT_SECRET", "sample-secret");
        let config = parse_config(sample_config()).unwrap();
        assert_eq!(config.hospitals.len(), 1);
        assert_eq!(config.hospitals[0].vendor, "cerner");
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("emr-gateway.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs {
            force: true,
            ..args
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(fs::read_to_string(&output).unwrap().contains("[[hospitals]]"));
    }
}
