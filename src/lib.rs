// EMR Gateway - vendor-agnostic EMR integration layer
// Copyright (c) 2025 EMR Gateway Contributors
// Licensed under the MIT License

//! # EMR Gateway - vendor-agnostic EMR integration
//!
//! EMR Gateway lets an application talk to heterogeneous Electronic Medical
//! Record systems (Epic, Cerner, Meditech, Allscripts and generic FHIR R4
//! servers) through one canonical interface.
//!
//! ## Overview
//!
//! This library provides:
//! - **Translation** of vendor wire shapes (FHIR REST, stubbed HL7 v2) into canonical
//!   [`Patient`](domain::Patient), [`Order`](domain::Order) and [`LabResult`](domain::LabResult) records
//! - **Authentication** with OAuth2 client credentials and single-flight token caching
//! - **Resilience** with a per-adapter circuit breaker, per-request deadlines and
//!   retry with exponential backoff around hospital registration
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Hospital registry ([`core::EmrManager`]) and resilience primitives
//! - [`adapters`] - The [`adapters::EmrAdapter`] trait, FHIR transport and vendor adapters
//! - [`domain`] - Canonical types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emr_gateway::config::secret_string;
//! use emr_gateway::core::EmrManager;
//! use emr_gateway::domain::{EmrConfig, EmrVendor, HospitalId, PatientQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = EmrManager::default();
//!
//!     let config = EmrConfig::new(
//!         EmrVendor::Cerner,
//!         "https://fhir.example",
//!         "c1",
//!         secret_string("s1".to_string()),
//!     )
//!     .with_scopes(["system/Patient.read"]);
//!
//!     let outcome = manager.register(HospitalId::new("st-marys")?, config).await;
//!     if !outcome.success {
//!         eprintln!("registration failed: {:?}", outcome.error);
//!         return Ok(());
//!     }
//!
//!     let adapter = manager.get("st-marys").await?;
//!     let health = adapter.health_check().await;
//!     println!("{} in {}ms", health.status, health.latency_ms);
//!
//!     let patients = adapter.search_patients(&PatientQuery::by_name("smith")).await?;
//!     println!("{} patients", patients.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Registration reports failures as a [`domain::ConnectOutcome`] value.
//! Everything else returns [`domain::EmrError`]; looking up an unregistered
//! hospital fails with `No EMR adapter for: <id>`.
//!
//! ## Logging
//!
//! The gateway uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(hospital_id = "st-marys", "Hospital registered");
//! warn!(vendor = "cerner", "Health probe failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
