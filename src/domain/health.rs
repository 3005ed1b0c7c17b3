//! Adapter health and connection outcome types

use crate::domain::errors::EmrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse availability of a vendor system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Healthy,
    Degraded,
    Down,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Availability::Healthy => "healthy",
            Availability::Degraded => "degraded",
            Availability::Down => "down",
        };
        f.write_str(s)
    }
}

/// Result of a health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: Availability,
    pub latency_ms: u64,
}

impl HealthStatus {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            status: Availability::Healthy,
            latency_ms,
        }
    }

    pub fn degraded(latency_ms: u64) -> Self {
        Self {
            status: Availability::Degraded,
            latency_ms,
        }
    }

    pub fn down(latency_ms: u64) -> Self {
        Self {
            status: Availability::Down,
            latency_ms,
        }
    }

    /// Classifies a successful probe against the degraded-latency threshold
    pub fn from_latency(latency_ms: u64, degraded_after_ms: u64) -> Self {
        if latency_ms > degraded_after_ms {
            Self::degraded(latency_ms)
        } else {
            Self::healthy(latency_ms)
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == Availability::Healthy
    }
}

/// Outcome of `connect` and `register`
///
/// Connecting never returns an `Err`; callers decide what to do with a
/// failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    /// Converts a failed outcome into an error so it can drive retries
    pub fn into_result(self) -> Result<(), EmrError> {
        if self.success {
            Ok(())
        } else {
            Err(EmrError::Connection(
                crate::domain::errors::ConnectionError::ProbeFailed(
                    self.error.unwrap_or_else(|| "unknown connection failure".to_string()),
                ),
            ))
        }
    }
}

impl From<EmrError> for ConnectOutcome {
    fn from(err: EmrError) -> Self {
        ConnectOutcome::failed(err.to_string())
    }
}
