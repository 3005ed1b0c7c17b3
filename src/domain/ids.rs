//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Hospital identifier newtype wrapper
///
/// Keys the adapter registry. One hospital maps to exactly one EMR backend.
///
/// # Examples
///
/// ```
/// use emr_gateway::domain::ids::HospitalId;
/// use std::str::FromStr;
///
/// let id = HospitalId::from_str("st-marys").unwrap();
/// assert_eq!(id.as_str(), "st-marys");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HospitalId(String);

impl HospitalId {
    /// Creates a new HospitalId, trimming surrounding whitespace
    ///
    /// Returns `Err` if the identifier is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Hospital ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the hospital ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HospitalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for HospitalId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HospitalId> for String {
    fn from(id: HospitalId) -> Self {
        id.0
    }
}

impl AsRef<str> for HospitalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lets registry maps be queried with `&str`
impl Borrow<str> for HospitalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
