//! Per-hospital EMR backend configuration

use crate::config::SecretString;
use crate::domain::errors::EmrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported EMR vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmrVendor {
    Epic,
    Cerner,
    Meditech,
    Allscripts,
    /// Generic FHIR R4 server
    Fhir,
}

impl EmrVendor {
    pub const ALL: [EmrVendor; 5] = [
        EmrVendor::Epic,
        EmrVendor::Cerner,
        EmrVendor::Meditech,
        EmrVendor::Allscripts,
        EmrVendor::Fhir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmrVendor::Epic => "epic",
            EmrVendor::Cerner => "cerner",
            EmrVendor::Meditech => "meditech",
            EmrVendor::Allscripts => "allscripts",
            EmrVendor::Fhir => "fhir",
        }
    }

    /// Resolves a raw vendor string, applying `policy` to unknown values
    pub fn resolve(raw: &str, policy: UnknownVendorPolicy) -> Result<Self, EmrError> {
        match raw.parse::<EmrVendor>() {
            Ok(vendor) => Ok(vendor),
            Err(e) => match policy {
                UnknownVendorPolicy::Reject => Err(e),
                UnknownVendorPolicy::Epic => {
                    tracing::warn!(
                        vendor = %raw,
                        "Unknown EMR vendor, falling back to the Epic adapter"
                    );
                    Ok(EmrVendor::Epic)
                }
            },
        }
    }
}

impl fmt::Display for EmrVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmrVendor {
    type Err = EmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epic" => Ok(EmrVendor::Epic),
            "cerner" => Ok(EmrVendor::Cerner),
            "meditech" => Ok(EmrVendor::Meditech),
            "allscripts" => Ok(EmrVendor::Allscripts),
            "fhir" => Ok(EmrVendor::Fhir),
            _ => Err(EmrError::UnsupportedVendor(s.to_string())),
        }
    }
}

/// What to do with a vendor string no adapter handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownVendorPolicy {
    /// Fail registration with `UnsupportedVendor`
    #[default]
    Reject,
    /// Route to the Epic adapter and log a warning
    Epic,
}

/// Connection settings for one hospital's EMR backend
///
/// Handed to an adapter at construction and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmrConfig {
    pub vendor: EmrVendor,
    pub base_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl EmrConfig {
    pub fn new(
        vendor: EmrVendor,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            vendor,
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret,
            scopes: Vec::new(),
            tenant_id: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Base URL without a trailing slash
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Scopes in OAuth2 wire form (space separated)
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }

    /// Checks that the base URL parses as an http(s) URL
    pub fn validate(&self) -> Result<(), EmrError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            EmrError::Validation(format!("Invalid base_url '{}': {e}", self.base_url))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EmrError::Validation(format!(
                "base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.client_id.trim().is_empty() {
            return Err(EmrError::Validation("client_id cannot be empty".to_string()));
        }
        Ok(())
    }
}
