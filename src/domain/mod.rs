//! Canonical domain model for the EMR gateway.
//!
//! Every vendor adapter maps its wire shapes onto these types, and the rest
//! of the application depends only on them.
//!
//! # Overview
//!
//! - **Canonical records** ([`Patient`], [`Order`], [`LabResult`])
//! - **Connection types** ([`EmrConfig`], [`EmrVendor`], [`HealthStatus`], [`ConnectOutcome`])
//! - **Identifiers** ([`HospitalId`])
//! - **Error types** ([`EmrError`], [`TransportError`], [`ConnectionError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use emr_gateway::config::secret_string;
//! use emr_gateway::domain::{EmrConfig, EmrVendor};
//!
//! let config = EmrConfig::new(
//!     EmrVendor::Cerner,
//!     "https://fhir.example",
//!     "c1",
//!     secret_string("s1".to_string()),
//! )
//! .with_scopes(["system/Patient.read"]);
//! assert_eq!(config.scope_param(), "system/Patient.read");
//! ```

pub mod emr_config;
pub mod errors;
pub mod health;
pub mod ids;
pub mod lab_result;
pub mod order;
pub mod patient;
pub mod result;

pub use emr_config::{EmrConfig, EmrVendor, UnknownVendorPolicy};
pub use errors::{ConnectionError, EmrError, TransportError};
pub use health::{Availability, ConnectOutcome, HealthStatus};
pub use ids::HospitalId;
pub use lab_result::{Interpretation, LabResult};
pub use order::{CodeSystem, Order, OrderStatus, OrderType, Priority};
pub use patient::{Gender, Patient, PatientQuery};
pub use result::Result;
