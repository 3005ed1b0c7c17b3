//! Hospital adapter registry
//!
//! [`EmrManager`] is the one entry point the rest of the application uses to
//! reach vendor systems. It builds adapters through the factory, connects them
//! under retry, and keeps the connected ones keyed by hospital.

use crate::adapters::{create_adapter, ConnectionSettings, EmrAdapter};
use crate::config::{GatewayConfig, HospitalConfig};
use crate::core::resilience::{with_retry, RetryPolicy};
use crate::domain::{
    ConnectOutcome, EmrConfig, EmrError, HealthStatus, HospitalId, Result, UnknownVendorPolicy,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry and factory for per-hospital EMR adapters
///
/// Construct one explicitly and pass it where it is needed; there is no
/// process-wide instance. The registry map is the only state shared between
/// call sites. Token caches and circuit breakers stay private to each adapter.
///
/// Only `register` retries. Adapter data calls are never retried here.
pub struct EmrManager {
    adapters: RwLock<HashMap<HospitalId, Arc<dyn EmrAdapter>>>,
    settings: ConnectionSettings,
    retry: RetryPolicy,
    unknown_vendor: UnknownVendorPolicy,
}

impl EmrManager {
    /// Create an empty registry
    pub fn new(
        settings: ConnectionSettings,
        retry: RetryPolicy,
        unknown_vendor: UnknownVendorPolicy,
    ) -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
            settings,
            retry,
            unknown_vendor,
        }
    }

    /// Create an empty registry tuned by the `[http]` and `[resilience]` sections
    ///
    /// Hospitals are not registered; see [`EmrManager::register_all`].
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.connection_settings(),
            config.resilience.retry_policy(),
            config.http.unknown_vendor,
        )
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Create, connect and store the adapter for `hospital_id`
    ///
    /// `connect` runs under the retry policy. Only a connected adapter is
    /// stored; on failure nothing is registered and the last failure is
    /// returned. Registering an id that is already present replaces the old
    /// adapter and disconnects it.
    pub async fn register(&self, hospital_id: HospitalId, config: EmrConfig) -> ConnectOutcome {
        let vendor = config.vendor;
        let adapter = match create_adapter(config, &self.settings) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::warn!(hospital_id = %hospital_id, error = %e, "Adapter creation failed");
                return ConnectOutcome::from(e);
            }
        };

        let candidate = &adapter;
        let connected = with_retry(&self.retry, || async move {
            candidate.connect().await.into_result()
        })
        .await;

        if let Err(e) = connected {
            tracing::warn!(
                hospital_id = %hospital_id,
                vendor = %vendor,
                error = %e,
                "Hospital registration failed"
            );
            return ConnectOutcome::from(e);
        }

        let previous = self
            .adapters
            .write()
            .await
            .insert(hospital_id.clone(), adapter);

        if let Some(previous) = previous {
            tracing::info!(hospital_id = %hospital_id, "Replacing registered adapter");
            previous.disconnect().await;
        }

        tracing::info!(hospital_id = %hospital_id, vendor = %vendor, "Hospital registered");
        ConnectOutcome::ok()
    }

    /// Register a hospital from its config-file entry
    ///
    /// The vendor string is resolved with the manager's unknown-vendor
    /// policy.
    pub async fn register_hospital(&self, hospital: &HospitalConfig) -> ConnectOutcome {
        let hospital_id = match hospital.hospital_id() {
            Ok(id) => id,
            Err(e) => return ConnectOutcome::from(e),
        };
        match hospital.to_emr_config(self.unknown_vendor) {
            Ok(config) => self.register(hospital_id, config).await,
            Err(e) => {
                tracing::warn!(
                    hospital_id = %hospital_id,
                    vendor = %hospital.vendor,
                    error = %e,
                    "Hospital registration rejected"
                );
                ConnectOutcome::from(e)
            }
        }
    }

    /// Register every hospital concurrently
    ///
    /// Outcomes are returned in input order, keyed by the configured id.
    pub async fn register_all(&self, hospitals: &[HospitalConfig]) -> Vec<(String, ConnectOutcome)> {
        let outcomes = join_all(hospitals.iter().map(|h| self.register_hospital(h))).await;
        hospitals
            .iter()
            .map(|h| h.id.clone())
            .zip(outcomes)
            .collect()
    }

    /// Disconnect and remove a hospital's adapter
    ///
    /// Returns `false` if nothing was registered under `hospital_id`.
    pub async fn unregister(&self, hospital_id: &str) -> bool {
        let removed = self.adapters.write().await.remove(hospital_id.trim());

        match removed {
            Some(adapter) => {
                adapter.disconnect().await;
                tracing::info!(hospital_id, "Hospital unregistered");
                true
            }
            None => false,
        }
    }

    /// Registered adapter for `hospital_id`
    ///
    /// # Errors
    ///
    /// Returns [`EmrError::RegistryMiss`] (`No EMR adapter for: <id>`) if the
    /// hospital is not registered. That indicates a caller bug, not a
    /// transient condition.
    pub async fn get(&self, hospital_id: &str) -> Result<Arc<dyn EmrAdapter>> {
        self.adapters
            .read()
            .await
            .get(hospital_id.trim())
            .cloned()
            .ok_or_else(|| EmrError::RegistryMiss(hospital_id.to_string()))
    }

    /// Registered hospital ids, sorted
    pub async fn hospital_ids(&self) -> Vec<HospitalId> {
        let mut ids: Vec<HospitalId> = self.adapters.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.adapters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.adapters.read().await.is_empty()
    }

    /// Probe every registered adapter concurrently
    ///
    /// The registry lock is released before any probe runs.
    pub async fn health_check_all(&self) -> Vec<(HospitalId, HealthStatus)> {
        let mut snapshot: Vec<(HospitalId, Arc<dyn EmrAdapter>)> = self
            .adapters
            .read()
            .await
            .iter()
            .map(|(id, adapter)| (id.clone(), Arc::clone(adapter)))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        let statuses = join_all(snapshot.iter().map(|(_, adapter)| adapter.health_check())).await;

        snapshot
            .into_iter()
            .map(|(id, _)| id)
            .zip(statuses)
            .collect()
    }
}

impl Default for EmrManager {
    fn default() -> Self {
        Self::new(
            ConnectionSettings::default(),
            RetryPolicy::default(),
            UnknownVendorPolicy::default(),
        )
    }
}
