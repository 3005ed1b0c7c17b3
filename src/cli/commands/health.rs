//! Health command implementation
//!
//! Registers the configured hospitals and prints one line per hospital.

use crate::cli::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_OK};
use crate::config::load_config;
use crate::core::EmrManager;
use crate::domain::{Availability, HealthStatus};
use clap::Args;
use std::collections::HashMap;

/// Arguments for the health command
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Only check this hospital
    #[arg(long)]
    pub hospital: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One row of the health report
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthRow {
    hospital_id: String,
    vendor: String,
    registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthStatus>,
}

impl HealthArgs {
    /// Execute the health command
    ///
    /// Returns the connection exit code if any hospital failed to register or
    /// reports `down`.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let hospitals: Vec<_> = config
            .hospitals
            .iter()
            .filter(|h| {
                self.hospital
                    .as_deref()
                    .map_or(true, |wanted| h.id.trim() == wanted.trim())
            })
            .cloned()
            .collect();

        if hospitals.is_empty() {
            println!("No matching hospitals configured.");
            return Ok(if self.hospital.is_some() {
                EXIT_CONFIG
            } else {
                EXIT_OK
            });
        }

        let manager = EmrManager::from_config(&config);
        let outcomes = manager.register_all(&hospitals).await;
        let health: HashMap<String, HealthStatus> = manager
            .health_check_all()
            .await
            .into_iter()
            .map(|(id, status)| (id.into_inner(), status))
            .collect();

        let rows: Vec<HealthRow> = hospitals
            .iter()
            .zip(outcomes)
            .map(|(hospital, (id, outcome))| HealthRow {
                health: health.get(id.trim()).copied(),
                hospital_id: id,
                vendor: hospital.vendor.clone(),
                registered: outcome.success,
                error: outcome.error,
            })
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            print_table(&rows);
        }

        let all_up = rows.iter().all(|row| {
            row.registered
                && row
                    .health
                    .map_or(false, |h| h.status != Availability::Down)
        });

        Ok(if all_up { EXIT_OK } else { EXIT_CONNECTION })
    }
}

fn print_table(rows: &[HealthRow]) {
    println!(
        "{:<24} {:<12} {:<12} {:<10} Detail",
        "Hospital", "Vendor", "Status", "Latency"
    );
    println!("{}", "-".repeat(80));

    for row in rows {
        let (status, latency) = match row.health {
            Some(h) => {
                let icon = match h.status {
                    Availability::Healthy => "✅",
                    Availability::Degraded => "⚠️ ",
                    Availability::Down => "❌",
                };
                (format!("{icon} {}", h.status), format!("{}ms", h.latency_ms))
            }
            None => ("❌ failed".to_string(), "-".to_string()),
        };
        println!(
            "{:<24} {:<12} {:<12} {:<10} {}",
            row.hospital_id,
            row.vendor,
            status,
            latency,
            row.error.as_deref().unwrap_or("")
        );
    }
}
