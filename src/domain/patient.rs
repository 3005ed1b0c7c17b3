//! Canonical patient model
//!
//! Patients are produced by vendor mapping functions only. Every field a
//! vendor payload carries that has a canonical counterpart is mapped; fields
//! the vendor does not supply stay `None`.

use serde::{Deserialize, Serialize};

/// Administrative gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    /// Maps a FHIR `administrativeGender` code, treating anything unrecognised as unknown
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            "other" => Gender::Other,
            _ => Gender::Unknown,
        }
    }
}

/// Vendor-neutral patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    /// Date of birth as an ISO-8601 date (`YYYY-MM-DD`)
    pub dob: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// Patient search criteria
///
/// All fields are optional; an empty query is passed through to the vendor
/// unchanged and the vendor decides what an unfiltered search returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientQuery {
    pub name: Option<String>,
    pub mrn: Option<String>,
    pub dob: Option<String>,
}

impl PatientQuery {
    /// Search by name
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Search by medical record number
    pub fn by_mrn(mrn: impl Into<String>) -> Self {
        Self {
            mrn: Some(mrn.into()),
            ..Default::default()
        }
    }

    /// Restrict to a date of birth
    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = Some(dob.into());
        self
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.mrn.is_none() && self.dob.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("male", Gender::Male)]
    #[test_case("FEMALE", Gender::Female)]
    #[test_case("other", Gender::Other)]
    #[test_case("unknown", Gender::Unknown)]
    #[test_case("x-custom", Gender::Unknown)]
    fn test_gender_from_code(code: &str, expected: Gender) {
        assert_eq!(Gender::from_code(code), expected);
    }

    #[test]
    fn test_patient_wire_shape() {
        let patient = Patient {
            id: "p1".to_string(),
            mrn: "MRN-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            dob: "1815-12-10".to_string(),
            gender: Gender::Female,
            phone: None,
            email: Some("ada@example.org".to_string()),
            allergies: None,
            conditions: None,
        };

        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["gender"], "female");
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn test_patient_query_builders() {
        let query = PatientQuery::by_name("Smith").with_dob("1970-01-01");
        assert_eq!(query.name.as_deref(), Some("Smith"));
        assert_eq!(query.dob.as_deref(), Some("1970-01-01"));
        assert!(query.mrn.is_none());
        assert!(!query.is_empty());
        assert!(PatientQuery::default().is_empty());
    }
}
