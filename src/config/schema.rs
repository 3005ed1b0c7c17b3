//! Configuration schema types
//!
//! Maps the TOML file onto typed sections. Every section has defaults, so a
//! file containing only `[[hospitals]]` entries is valid.

use crate::adapters::ConnectionSettings;
use crate::config::SecretString;
use crate::core::resilience::{CircuitBreakerConfig, RetryPolicy};
use crate::domain::{EmrConfig, EmrError, EmrVendor, HospitalId, UnknownVendorPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    /// Requires https for every hospital base URL
    Production,
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub environment: Environment,

    /// Outbound HTTP behaviour shared by all adapters
    #[serde(default)]
    pub http: HttpConfig,

    /// Circuit breaker and registration retry tuning
    #[serde(default)]
    pub resilience: ResilienceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hospitals registered at startup
    #[serde(default)]
    pub hospitals: Vec<HospitalConfig>,
}

impl GatewayConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value found
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.http.validate()?;
        self.resilience.validate()?;
        self.logging.validate()?;

        let mut seen = HashSet::new();
        for hospital in &self.hospitals {
            hospital.validate(&self.environment, self.http.unknown_vendor)?;
            if !seen.insert(hospital.id.trim()) {
                return Err(format!("Duplicate hospital id '{}'", hospital.id));
            }
        }
        Ok(())
    }

    /// Adapter construction settings derived from `[http]` and `[resilience]`
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            request_timeout: Duration::from_secs(self.http.request_timeout_seconds),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_seconds),
            degraded_latency: Duration::from_millis(self.http.degraded_latency_ms),
            circuit_breaker: self.resilience.circuit_breaker(),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Deadline for one outbound request, token fetch included
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Probe latency above which a reachable vendor reports `degraded`
    #[serde(default = "default_degraded_latency_ms")]
    pub degraded_latency_ms: u64,

    /// Handling of vendor strings no adapter supports
    #[serde(default)]
    pub unknown_vendor: UnknownVendorPolicy,
}

impl HttpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.request_timeout_seconds == 0 {
            return Err("http.request_timeout_seconds must be greater than 0".to_string());
        }
        if self.connect_timeout_seconds == 0 {
            return Err("http.connect_timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            degraded_latency_ms: default_degraded_latency_ms(),
            unknown_vendor: UnknownVendorPolicy::default(),
        }
    }
}

/// Circuit breaker and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive failures that open an adapter's circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cooldown before a half-open trial call
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    /// Extra connection attempts during registration
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First registration backoff; doubles per retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl ResilienceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("resilience.failure_threshold must be at least 1".to_string());
        }
        if self.max_retries > 10 {
            return Err(format!(
                "resilience.max_retries must be between 0 and 10, got {}",
                self.max_retries
            ));
        }
        Ok(())
    }

    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

/// One hospital's EMR backend as written in the config file
///
/// `vendor` stays a string here so the unknown-vendor policy can be applied
/// when it is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalConfig {
    pub id: String,
    pub vendor: String,
    pub base_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl HospitalConfig {
    fn validate(
        &self,
        environment: &Environment,
        policy: UnknownVendorPolicy,
    ) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let id = self.hospital_id().map_err(|e| e.to_string())?;

        let config = self.to_emr_config(policy).map_err(|e| format!("hospital '{id}': {e}"))?;
        config
            .validate()
            .map_err(|e| format!("hospital '{id}': {e}"))?;

        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(format!(
                "hospital '{id}': base_url must use https:// in production environments"
            ));
        }

        if self.client_secret.expose_secret().is_empty() {
            return Err(format!("hospital '{id}': client_secret cannot be empty"));
        }
        Ok(())
    }

    pub fn hospital_id(&self) -> Result<HospitalId, EmrError> {
        HospitalId::new(self.id.as_str()).map_err(EmrError::Validation)
    }

    /// Resolve into the adapter-facing configuration
    pub fn to_emr_config(&self, policy: UnknownVendorPolicy) -> Result<EmrConfig, EmrError> {
        let vendor = EmrVendor::resolve(&self.vendor, policy)?;
        Ok(EmrConfig {
            vendor,
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: self.scopes.clone(),
            tenant_id: self.tenant_id.clone(),
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a local rolling file
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// daily, hourly or never
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_degraded_latency_ms() -> u64 {
    2000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
