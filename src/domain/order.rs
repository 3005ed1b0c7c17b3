//! Canonical order model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of clinical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Lab,
    Radiology,
    Medication,
    Procedure,
    Referral,
}

/// Terminology an order code is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeSystem {
    #[serde(rename = "LOINC")]
    Loinc,
    #[serde(rename = "CPT")]
    Cpt,
    #[serde(rename = "SNOMED")]
    Snomed,
    #[serde(rename = "RxNorm")]
    RxNorm,
    #[serde(rename = "ICD10")]
    Icd10,
}

impl CodeSystem {
    /// Canonical FHIR system URI for this terminology
    pub fn uri(&self) -> &'static str {
        match self {
            CodeSystem::Loinc => "http://loinc.org",
            CodeSystem::Cpt => "http://www.ama-assn.org/go/cpt",
            CodeSystem::Snomed => "http://snomed.info/sct",
            CodeSystem::RxNorm => "http://www.nlm.nih.gov/research/umls/rxnorm",
            CodeSystem::Icd10 => "http://hl7.org/fhir/sid/icd-10",
        }
    }
}

/// Order urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Routine,
    Urgent,
    Stat,
}

impl Priority {
    /// FHIR `request-priority` code
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Routine => "routine",
            Priority::Urgent => "urgent",
            Priority::Stat => "stat",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// Vendor-neutral order
///
/// `id` stays `None` until the vendor accepts the order and assigns one.
/// `create_order` never changes `patient_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub code: String,
    pub code_system: CodeSystem,
    pub description: String,
    pub priority: Priority,
    pub status: OrderStatus,
    pub ordering_provider: String,
}

impl Order {
    /// Returns the order with the vendor-assigned identifier set
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
