//! Domain error types
//!
//! This module defines the error hierarchy for the EMR gateway. Errors are
//! domain-specific and never expose `reqwest` or other third-party types, so
//! callers can match on them without depending on the transport stack.

use std::time::Duration;
use thiserror::Error;

/// Main gateway error type
///
/// Registration failures are normally reported through
/// [`ConnectOutcome`](crate::domain::ConnectOutcome) instead; everything else
/// (transport, circuit-open, registry misses) propagates as this error.
#[derive(Debug, Error)]
pub enum EmrError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token or liveness probe failed while connecting
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Network failure or non-2xx response during a call
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The adapter's circuit breaker is open and the call was not attempted
    #[error("Circuit breaker is open, retry after {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    /// Lookup of a hospital that was never registered
    #[error("No EMR adapter for: {0}")]
    RegistryMiss(String),

    /// Vendor string that no adapter handles
    #[error("Unsupported EMR vendor: {0}")]
    UnsupportedVendor(String),

    /// Operation whose vendor protocol has not been built yet
    #[error("{operation} is not implemented for {vendor}")]
    NotImplemented {
        vendor: &'static str,
        operation: &'static str,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Failures while establishing a connection to a vendor system
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The OAuth2 token endpoint rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The liveness probe did not succeed
    #[error("Liveness probe failed: {0}")]
    ProbeFailed(String),
}

/// Transport-level failures on an outbound call
///
/// These are the failures a circuit breaker counts.
#[derive(Debug, Error)]
pub enum TransportError {
    /// FHIR endpoint answered with a non-2xx status
    #[error("FHIR failed: {status}")]
    Status { status: u16 },

    /// Token endpoint answered with a non-2xx status
    #[error("Token request failed: {status}")]
    TokenRequest { status: u16 },

    /// Request could not be sent or the connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Response body could not be parsed
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl EmrError {
    /// Returns true if this error was produced by an open circuit
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, EmrError::CircuitOpen { .. })
    }
}

impl From<std::io::Error> for EmrError {
    fn from(err: std::io::Error) -> Self {
        EmrError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EmrError {
    fn from(err: serde_json::Error) -> Self {
        EmrError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EmrError {
    fn from(err: toml::de::Error) -> Self {
        EmrError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::InvalidResponse(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
