//! FHIR-backed implementation of the canonical operations
//!
//! [`FhirBackend`] is what the Cerner and Epic adapters delegate to: one
//! [`FhirClient`] plus the connection flag and health classification.

use super::client::FhirClient;
use super::mapping::{
    lab_result_from_report, patient_from_fhir, patient_search_params, service_request_from_order,
};
use super::models::{Bundle, DiagnosticReport, FhirPatient};
use crate::adapters::factory::ConnectionSettings;
use crate::domain::{
    ConnectOutcome, EmrConfig, EmrError, EmrVendor, HealthStatus, LabResult, Order, Patient,
    PatientQuery, Result, TransportError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Liveness endpoint of every FHIR server
const METADATA: &str = "metadata";

pub struct FhirBackend {
    vendor: EmrVendor,
    base_url: String,
    client: FhirClient,
    degraded_latency: Duration,
    connected: AtomicBool,
}

impl FhirBackend {
    pub fn new(config: &EmrConfig, settings: &ConnectionSettings) -> Result<Self> {
        Ok(Self {
            vendor: config.vendor,
            base_url: config.base_url.clone(),
            client: FhirClient::new(config, settings)?,
            degraded_latency: settings.degraded_latency,
            connected: AtomicBool::new(false),
        })
    }

    pub fn vendor(&self) -> EmrVendor {
        self.vendor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &FhirClient {
        &self.client
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Acquire a token and probe `/metadata`
    pub async fn connect(&self) -> ConnectOutcome {
        match self.client.get::<serde_json::Value>(METADATA, Vec::new()).await {
            Ok(_) => {
                self.connected.store(true, Ordering::Release);
                tracing::info!(
                    vendor = %self.vendor,
                    base_url = %self.base_url,
                    "Connected to FHIR server"
                );
                ConnectOutcome::ok()
            }
            Err(e) => {
                self.connected.store(false, Ordering::Release);
                tracing::warn!(
                    vendor = %self.vendor,
                    base_url = %self.base_url,
                    error = %e,
                    "FHIR connection failed"
                );
                ConnectOutcome::from(e)
            }
        }
    }

    pub async fn disconnect(&self) {
        self.client.clear_token().await;
        self.connected.store(false, Ordering::Release);
        tracing::debug!(vendor = %self.vendor, base_url = %self.base_url, "Disconnected");
    }

    /// Time a `/metadata` probe and classify it
    pub async fn health_check(&self) -> HealthStatus {
        let started = Instant::now();
        let result = self.client.get::<serde_json::Value>(METADATA, Vec::new()).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(_) => {
                let degraded_after_ms =
                    u64::try_from(self.degraded_latency.as_millis()).unwrap_or(u64::MAX);
                HealthStatus::from_latency(latency_ms, degraded_after_ms)
            }
            Err(e) => {
                tracing::warn!(
                    vendor = %self.vendor,
                    base_url = %self.base_url,
                    error = %e,
                    latency_ms,
                    "Health probe failed"
                );
                HealthStatus::down(latency_ms)
            }
        }
    }

    pub async fn search_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>> {
        let bundle: Bundle = self
            .client
            .get("Patient", patient_search_params(query))
            .await?;

        let patients: Vec<Patient> = bundle
            .resources::<FhirPatient>("Patient")
            .iter()
            .map(patient_from_fhir)
            .collect();

        tracing::debug!(
            vendor = %self.vendor,
            matches = patients.len(),
            total = ?bundle.total,
            "Patient search completed"
        );

        Ok(patients)
    }

    pub async fn get_patient(&self, id: &str) -> Result<Patient> {
        let id = non_empty_id(id, "patient id")?;
        let resource: FhirPatient = self
            .client
            .get(&format!("Patient/{id}"), Vec::new())
            .await?;
        Ok(patient_from_fhir(&resource))
    }

    /// POST a `ServiceRequest` and return `order` with the assigned id
    pub async fn create_order(&self, order: Order) -> Result<Order> {
        let request = service_request_from_order(&order);
        let created: serde_json::Value = self.client.post("ServiceRequest", &request).await?;

        let id = created
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                TransportError::InvalidResponse(
                    "ServiceRequest response carries no id".to_string(),
                )
            })?;

        tracing::info!(
            vendor = %self.vendor,
            order_id = id,
            patient_id = %order.patient_id,
            "Order created"
        );

        Ok(order.with_id(id))
    }

    /// Lab results from `DiagnosticReport` search
    ///
    /// Value, unit, reference range and interpretation are not carried by a
    /// report, so every mapped result is degraded. That is logged rather than
    /// hidden.
    pub async fn get_lab_results(&self, patient_id: &str) -> Result<Vec<LabResult>> {
        let patient_id = non_empty_id(patient_id, "patient id")?;
        let bundle: Bundle = self
            .client
            .get(
                "DiagnosticReport",
                vec![("patient".to_string(), patient_id.to_string())],
            )
            .await?;

        let results: Vec<LabResult> = bundle
            .resources::<DiagnosticReport>("DiagnosticReport")
            .iter()
            .map(|report| lab_result_from_report(report, patient_id))
            .collect();

        if !results.is_empty() {
            tracing::warn!(
                vendor = %self.vendor,
                patient_id,
                count = results.len(),
                unmapped = "unit,referenceRange,interpretation",
                "UnmappedFieldDegradation: lab results mapped from DiagnosticReport"
            );
        }

        Ok(results)
    }
}

fn non_empty_id<'a>(id: &'a str, what: &str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(EmrError::Validation(format!("{what} cannot be empty")));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::core::resilience::CircuitBreakerConfig;
    use crate::domain::{Availability, CodeSystem, OrderStatus, OrderType, Priority};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    async fn server_with_token() -> ServerGuard {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .create_async()
            .await;
        server
    }

    fn backend(server: &ServerGuard) -> FhirBackend {
        let config = EmrConfig::new(
            EmrVendor::Cerner,
            server.url(),
            "c1",
            secret_string("s1".to_string()),
        );
        let settings = ConnectionSettings {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 3,
                reset_timeout: Duration::from_secs(60),
            },
            ..ConnectionSettings::default()
        };
        FhirBackend::new(&config, &settings).unwrap()
    }

    #[tokio::test]
    async fn test_connect_sets_flag() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/metadata")
            .with_status(200)
            .with_body(r#"{"resourceType":"CapabilityStatement"}"#)
            .create_async()
            .await;

        let backend = backend(&server);
        assert!(backend.connect().await.success);
        assert!(backend.is_connected());

        backend.disconnect().await;
        assert!(!backend.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_is_outcome() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/metadata")
            .with_status(503)
            .create_async()
            .await;

        let outcome = backend(&server).connect().await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("FHIR failed: 503"));
    }

    #[tokio::test]
    async fn test_health_check_down_on_error() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/metadata")
            .with_status(500)
            .create_async()
            .await;

        let health = backend(&server).health_check().await;
        assert_eq!(health.status, Availability::Down);
    }

    #[tokio::test]
    async fn test_health_check_healthy() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/metadata")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let health = backend(&server).health_check().await;
        assert_eq!(health.status, Availability::Healthy);
    }

    #[tokio::test]
    async fn test_search_patients_maps_bundle() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/Patient")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "smith".into()),
                Matcher::UrlEncoded("identifier".into(), "MRN-1".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "resourceType": "Bundle",
                    "total": 1,
                    "entry": [{"resource": {
                        "resourceType": "Patient",
                        "id": "p1",
                        "identifier": [{"value": "MRN-1"}],
                        "name": [{"family": "Smith", "given": ["Ann"]}],
                        "gender": "female",
                        "birthDate": "1980-02-01"
                    }}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let query = PatientQuery {
            name: Some("smith".to_string()),
            mrn: Some("MRN-1".to_string()),
            dob: None,
        };
        let patients = backend(&server).search_patients(&query).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, "p1");
        assert_eq!(patients[0].last_name, "Smith");
        assert_eq!(patients[0].mrn, "MRN-1");
    }

    #[tokio::test]
    async fn test_empty_id_rejected_without_io() {
        let server = Server::new_async().await;
        let err = backend(&server).get_patient("  ").await.unwrap_err();
        assert!(matches!(err, EmrError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_order_returns_vendor_id() {
        let mut server = server_with_token().await;
        server
            .mock("POST", "/ServiceRequest")
            .match_body(Matcher::PartialJson(json!({
                "resourceType": "ServiceRequest",
                "status": "active",
                "intent": "order",
                "subject": {"reference": "Patient/p1"}
            })))
            .with_status(201)
            .with_body(r#"{"resourceType":"ServiceRequest","id":"sr-9"}"#)
            .create_async()
            .await;

        let order = Order {
            id: None,
            patient_id: "p1".to_string(),
            order_type: OrderType::Lab,
            code: "2345-7".to_string(),
            code_system: CodeSystem::Loinc,
            description: "Glucose".to_string(),
            priority: Priority::Routine,
            status: OrderStatus::Draft,
            ordering_provider: "Dr. Who".to_string(),
        };

        let created = backend(&server).create_order(order.clone()).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("sr-9"));
        assert_eq!(created.patient_id, order.patient_id);
    }

    #[tokio::test]
    async fn test_lab_results_from_reports() {
        let mut server = server_with_token().await;
        server
            .mock("GET", "/DiagnosticReport")
            .match_query(Matcher::UrlEncoded("patient".into(), "p1".into()))
            .with_status(200)
            .with_body(
                json!({
                    "resourceType": "Bundle",
                    "entry": [{"resource": {
                        "resourceType": "DiagnosticReport",
                        "id": "dr-1",
                        "status": "final",
                        "code": {"coding": [{"code": "24323-8"}], "text": "CMP"},
                        "basedOn": [{"reference": "ServiceRequest/sr-9"}],
                        "conclusion": "Within limits"
                    }}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let results = backend(&server).get_lab_results("p1").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].order_id, "sr-9");
        assert_eq!(results[0].unit, "");
        assert_eq!(results[0].reference_range, "");
    }
}
