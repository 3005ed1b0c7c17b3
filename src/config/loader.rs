//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::GatewayConfig;
use crate::domain::errors::EmrError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// Steps, in order:
/// 1. Read the file
/// 2. Substitute `${VAR}` placeholders from the environment
/// 3. Parse the TOML into [`GatewayConfig`]
/// 4. Apply `EMR_*` environment overrides
/// 5. Validate
///
/// # Errors
///
/// Returns [`EmrError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use emr_gateway::config::loader::load_config;
///
/// let config = load_config("emr-gateway.toml").expect("Failed to load config");
/// println!("{} hospitals configured", config.hospitals.len());
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EmrError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EmrError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<GatewayConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: GatewayConfig = toml::from_str(&contents)
        .map_err(|e| EmrError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        EmrError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Every missing variable is reported at
/// once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| EmrError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let substituted = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == name) {
                        missing_vars.push(name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&substituted);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(EmrError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `EMR_` prefix
///
/// Pattern: `EMR_<SECTION>_<KEY>`, e.g. `EMR_HTTP_REQUEST_TIMEOUT_SECONDS`.
/// Unparseable values are ignored and the file value is kept.
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(val) = std::env::var("EMR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    override_parsed("EMR_HTTP_REQUEST_TIMEOUT_SECONDS", &mut config.http.request_timeout_seconds);
    override_parsed("EMR_HTTP_CONNECT_TIMEOUT_SECONDS", &mut config.http.connect_timeout_seconds);
    override_parsed("EMR_HTTP_DEGRADED_LATENCY_MS", &mut config.http.degraded_latency_ms);

    override_parsed("EMR_RESILIENCE_FAILURE_THRESHOLD", &mut config.resilience.failure_threshold);
    override_parsed("EMR_RESILIENCE_RESET_TIMEOUT_MS", &mut config.resilience.reset_timeout_ms);
    override_parsed("EMR_RESILIENCE_MAX_RETRIES", &mut config.resilience.max_retries);
    override_parsed("EMR_RESILIENCE_INITIAL_DELAY_MS", &mut config.resilience.initial_delay_ms);

    override_parsed("EMR_LOGGING_LOCAL_ENABLED", &mut config.logging.local_enabled);
    if let Ok(val) = std::env::var("EMR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

fn override_parsed<T: FromStr>(var: &str, target: &mut T) {
    if let Ok(val) = std::env::var(var) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(variable = var, value = %val, "Ignoring unparseable override"),
        }
    }
}
