//! Configuration management for the EMR gateway.
//!
//! TOML configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `EMR_*` environment overrides
//! - Defaults for every optional setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emr_gateway::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("emr-gateway.toml")?;
//! for hospital in &config.hospitals {
//!     println!("{} -> {} ({})", hospital.id, hospital.base_url, hospital.vendor);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//!
//! [http]
//! request_timeout_seconds = 30
//! degraded_latency_ms = 2000
//! unknown_vendor = "reject"
//!
//! [resilience]
//! failure_threshold = 5
//! reset_timeout_ms = 30000
//! max_retries = 3
//! initial_delay_ms = 1000
//!
//! [[hospitals]]
//! id = "st-marys"
//! vendor = "cerner"
//! base_url = "https://fhir.example"
//! client_id = "c1"
//! client_secret = "${ST_MARYS_CLIENT_SECRET}"
//! scopes = ["system/Patient.read"]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, GatewayConfig, HospitalConfig, HttpConfig, LoggingConfig,
    ResilienceConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
