//! FHIR R4 transport and mapping
//!
//! - [`client`] - OAuth2 client-credentials + HTTP transport behind a circuit breaker
//! - [`models`] - FHIR wire shapes
//! - [`mapping`] - FHIR to canonical conversions
//! - [`backend`] - canonical operations shared by the FHIR-speaking adapters

pub mod backend;
pub mod client;
pub mod mapping;
pub mod models;

pub use backend::FhirBackend;
pub use client::{FhirClient, RequestOptions, FHIR_JSON};
pub use models::{Bundle, DiagnosticReport, FhirPatient, ServiceRequest};
