//! EMR adapter capability set
//!
//! This module defines the `EmrAdapter` trait every vendor integration
//! implements. The rest of the application talks to vendor systems only
//! through this trait, obtained from
//! [`EmrManager::get`](crate::core::manager::EmrManager::get).

use crate::domain::{
    ConnectOutcome, EmrVendor, HealthStatus, LabResult, Order, Patient, PatientQuery, Result,
};
use async_trait::async_trait;

/// One vendor's implementation of the canonical EMR operations
///
/// Adapters are shared behind `Arc` and take `&self` everywhere; connection
/// state lives behind interior mutability.
///
/// # Example
///
/// ```no_run
/// use emr_gateway::adapters::{create_adapter, ConnectionSettings, EmrAdapter};
/// use emr_gateway::config::secret_string;
/// use emr_gateway::domain::{EmrConfig, EmrVendor, PatientQuery};
///
/// # async fn example() -> emr_gateway::domain::Result<()> {
/// let config = EmrConfig::new(
///     EmrVendor::Cerner,
///     "https://fhir.example",
///     "c1",
///     secret_string("s1".to_string()),
/// );
/// let adapter = create_adapter(config, &ConnectionSettings::default())?;
///
/// adapter.connect().await.into_result()?;
/// let patients = adapter.search_patients(&PatientQuery::by_name("smith")).await?;
/// println!("{} matches", patients.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait EmrAdapter: Send + Sync {
    /// Vendor this adapter speaks to
    fn vendor(&self) -> EmrVendor;

    /// Base URL from the adapter's configuration
    fn base_url(&self) -> &str;

    /// Whether the last `connect` succeeded and `disconnect` was not called since
    fn is_connected(&self) -> bool;

    /// Authenticate and probe the vendor system
    ///
    /// Never fails with an error; failures come back as
    /// `ConnectOutcome { success: false, .. }`.
    async fn connect(&self) -> ConnectOutcome;

    /// Drop credentials and mark the adapter disconnected
    async fn disconnect(&self);

    /// Cheap liveness probe
    ///
    /// Never fails; any probe error, an open circuit included, maps to
    /// `down`.
    async fn health_check(&self) -> HealthStatus;

    /// Search patients by name, MRN and/or date of birth
    ///
    /// # Errors
    ///
    /// Transport and circuit-open errors propagate unchanged.
    async fn search_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>>;

    /// Fetch one patient by vendor id
    ///
    /// # Errors
    ///
    /// Transport and circuit-open errors propagate unchanged.
    async fn get_patient(&self, id: &str) -> Result<Patient>;

    /// Submit an order; the returned order carries the vendor-assigned id
    ///
    /// # Errors
    ///
    /// Transport and circuit-open errors propagate unchanged.
    async fn create_order(&self, order: Order) -> Result<Order>;

    /// Lab results for a patient
    ///
    /// # Errors
    ///
    /// Transport and circuit-open errors propagate unchanged.
    async fn get_lab_results(&self, patient_id: &str) -> Result<Vec<LabResult>>;
}
