//! Adapter factory
//!
//! Turns an [`EmrConfig`] into a live adapter instance. Dispatch is keyed on
//! [`EmrVendor`]; unknown vendor strings are resolved before they get here
//! (see [`EmrVendor::resolve`]).

use crate::adapters::traits::EmrAdapter;
use crate::adapters::vendor::{AllscriptsAdapter, CernerAdapter, EpicAdapter, MeditechAdapter};
use crate::core::resilience::CircuitBreakerConfig;
use crate::domain::{EmrConfig, EmrError, EmrVendor, Result};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Added to `request_timeout` for the reqwest client's own overall timeout,
/// so the per-request deadline is the one that fires
pub const HTTP_TIMEOUT_HEADROOM: Duration = Duration::from_secs(5);

/// Settings shared by every adapter a manager creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Deadline for one outbound call, token acquisition included
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,

    /// Probe latency above which a reachable vendor is `degraded`
    pub degraded_latency: Duration,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            degraded_latency: Duration::from_millis(2000),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Build the `reqwest` client used by one adapter
///
/// # Errors
///
/// Returns [`EmrError::Configuration`] if the TLS backend cannot be initialised.
pub fn build_http_client(settings: &ConnectionSettings) -> Result<Client> {
    ClientBuilder::new()
        .timeout(settings.request_timeout + HTTP_TIMEOUT_HEADROOM)
        .connect_timeout(settings.connect_timeout)
        .user_agent(concat!("emr-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EmrError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Create the adapter for `config.vendor`
///
/// The adapter is returned unconnected; callers run `connect` (the manager
/// does so under retry).
///
/// # Errors
///
/// Returns [`EmrError::Validation`] for an unusable base URL or client id,
/// or a configuration error if the HTTP client cannot be built.
pub fn create_adapter(
    config: EmrConfig,
    settings: &ConnectionSettings,
) -> Result<Arc<dyn EmrAdapter>> {
    config.validate()?;

    tracing::debug!(
        vendor = %config.vendor,
        base_url = %config.base_url,
        "Creating EMR adapter"
    );

    let adapter: Arc<dyn EmrAdapter> = match config.vendor {
        EmrVendor::Cerner => Arc::new(CernerAdapter::new(config, settings)?),
        EmrVendor::Epic | EmrVendor::Fhir => Arc::new(EpicAdapter::new(config, settings)?),
        EmrVendor::Meditech => Arc::new(MeditechAdapter::new(config)),
        EmrVendor::Allscripts => Arc::new(AllscriptsAdapter::new(config, settings)?),
    };

    Ok(adapter)
}
