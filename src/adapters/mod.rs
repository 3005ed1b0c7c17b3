//! Vendor integrations for the EMR gateway.
//!
//! - [`traits`] - the [`EmrAdapter`] capability set
//! - [`fhir`] - FHIR R4 client, wire models and mapping
//! - [`vendor`] - Cerner, Epic, Meditech and Allscripts adapters
//! - [`factory`] - vendor-keyed adapter construction
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: each vendor protocol is hidden
//! behind one trait so callers never see wire shapes. FHIR-speaking vendors
//! share [`fhir::FhirBackend`]; every outbound FHIR call goes through that
//! adapter's own circuit breaker.
//!
//! ```rust,no_run
//! use emr_gateway::adapters::{create_adapter, ConnectionSettings};
//! use emr_gateway::config::secret_string;
//! use emr_gateway::domain::{EmrConfig, EmrVendor};
//!
//! # async fn example() -> emr_gateway::domain::Result<()> {
//! let config = EmrConfig::new(
//!     EmrVendor::Epic,
//!     "https://fhir.epic.example/api/FHIR/R4",
//!     "client-id",
//!     secret_string("client-secret".to_string()),
//! )
//! .with_scopes(["system/Patient.read"]);
//!
//! let adapter = create_adapter(config, &ConnectionSettings::default())?;
//! let health = adapter.health_check().await;
//! println!("{} ({}ms)", health.status, health.latency_ms);
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod fhir;
pub mod traits;
pub mod vendor;

pub use factory::{build_http_client, create_adapter, ConnectionSettings};
pub use traits::EmrAdapter;
