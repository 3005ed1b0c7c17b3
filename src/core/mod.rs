//! Core orchestration for the EMR gateway.
//!
//! # Modules
//!
//! - [`manager`] - hospital registry and the application's entry point
//! - [`resilience`] - circuit breaker and registration retry
//!
//! # Example
//!
//! ```rust,no_run
//! use emr_gateway::config::load_config;
//! use emr_gateway::core::manager::EmrManager;
//! use emr_gateway::domain::PatientQuery;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("emr-gateway.toml")?;
//! let manager = EmrManager::from_config(&config);
//!
//! for (hospital, outcome) in manager.register_all(&config.hospitals).await {
//!     println!("{hospital}: {}", if outcome.success { "connected" } else { "failed" });
//! }
//!
//! let adapter = manager.get("st-marys").await?;
//! let patients = adapter.search_patients(&PatientQuery::by_mrn("12345")).await?;
//! println!("{} patients", patients.len());
//! # Ok(())
//! # }
//! ```

pub mod manager;
pub mod resilience;

pub use manager::EmrManager;
