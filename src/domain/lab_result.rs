//! Canonical lab result model

use serde::{Deserialize, Serialize};

/// Clinical interpretation of a result value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpretation {
    #[default]
    Normal,
    Abnormal,
    Critical,
}

/// Vendor-neutral lab result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub id: String,
    pub order_id: String,
    pub patient_id: String,
    pub code: String,
    pub name: String,
    pub value: String,
    pub unit: String,
    pub reference_range: String,
    pub interpretation: Interpretation,
    pub collected_at: String,
    pub resulted_at: String,
}
