//! Search command implementation

use crate::cli::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK};
use crate::config::load_config;
use crate::core::EmrManager;
use crate::domain::PatientQuery;
use clap::Args;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Hospital id from the configuration file
    #[arg(long)]
    pub hospital: String,

    /// Patient name
    #[arg(long)]
    pub name: Option<String>,

    /// Medical record number
    #[arg(long)]
    pub mrn: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,
}

impl SearchArgs {
    fn query(&self) -> PatientQuery {
        PatientQuery {
            name: self.name.clone(),
            mrn: self.mrn.clone(),
            dob: self.dob.clone(),
        }
    }

    /// Execute the search command, printing matches as JSON
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration file: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let Some(hospital) = config
            .hospitals
            .iter()
            .find(|h| h.id.trim() == self.hospital.trim())
        else {
            eprintln!("❌ Hospital '{}' is not configured", self.hospital);
            return Ok(EXIT_CONFIG);
        };

        let manager = EmrManager::from_config(&config);
        let outcome = manager.register_hospital(hospital).await;
        if !outcome.success {
            eprintln!(
                "❌ Could not connect to '{}': {}",
                self.hospital,
                outcome.error.unwrap_or_default()
            );
            return Ok(EXIT_CONNECTION);
        }

        let adapter = manager.get(&self.hospital).await?;
        match adapter.search_patients(&self.query()).await {
            Ok(patients) => {
                tracing::info!(
                    hospital_id = %self.hospital,
                    matches = patients.len(),
                    "Patient search completed"
                );
                println!("{}", serde_json::to_string_pretty(&patients)?);
                Ok(EXIT_OK)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Patient search failed");
                eprintln!("❌ Search failed: {e}");
                Ok(if e.is_circuit_open() || matches!(e, crate::domain::EmrError::Transport(_)) {
                    EXIT_CONNECTION
                } else {
                    EXIT_FATAL
                })
            }
        }
    }
}
