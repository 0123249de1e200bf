//! Host telemetry probe backed by sysinfo.
//!
//! Sampling is CPU-bound and briefly sleeps (sysinfo needs two CPU
//! refreshes a short interval apart for a meaningful load figure), so
//! it runs on the blocking pool. Service reachability is a plain GET
//! against the inference API's tags endpoint.

use async_trait::async_trait;
use braid_application::TelemetryProbe;
use braid_domain::{ServiceStatus, SystemStats};
use std::time::Duration;
use sysinfo::{Disks, System};
use tracing::warn;

/// Interval between the two CPU refreshes of one sample.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

pub struct SysinfoProbe {
    client: reqwest::Client,
    tags_url: String,
}

impl SysinfoProbe {
    /// `base_url` is the inference service root, e.g. `http://localhost:11434`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            tags_url: format!("{base_url}/api/tags"),
        }
    }

    async fn service_status(&self) -> ServiceStatus {
        let reachable = self
            .client
            .get(&self.tags_url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false);
        if reachable {
            ServiceStatus::Online
        } else {
            ServiceStatus::Offline
        }
    }
}

fn sample_host() -> SystemStats {
    let mut system = System::new();

    system.refresh_cpu_usage();
    std::thread::sleep(CPU_SAMPLE_INTERVAL);
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu_percent = system.global_cpu_usage();

    let ram_total = system.total_memory();
    let ram_used = system.used_memory();
    let ram_percent = if ram_total > 0 {
        ram_used as f32 / ram_total as f32 * 100.0
    } else {
        0.0
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_total: u64 = disks.iter().map(|d| d.total_space()).sum();
    let disk_available: u64 = disks.iter().map(|d| d.available_space()).sum();
    let disk_used = disk_total.saturating_sub(disk_available);
    let disk_percent = if disk_total > 0 {
        disk_used as f32 / disk_total as f32 * 100.0
    } else {
        0.0
    };

    SystemStats {
        cpu_percent,
        ram_total,
        ram_used,
        ram_percent,
        disk_total,
        disk_used,
        disk_percent,
        uptime: System::uptime(),
        service_status: ServiceStatus::Offline,
    }
}

#[async_trait]
impl TelemetryProbe for SysinfoProbe {
    async fn sample(&self) -> SystemStats {
        let status = self.service_status().await;
        match tokio::task::spawn_blocking(sample_host).await {
            Ok(mut stats) => {
                stats.service_status = status;
                stats
            }
            Err(e) => {
                warn!(error = %e, "host sampling task failed");
                let mut stats = SystemStats::empty();
                stats.service_status = status;
                stats
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_sample_reports_plausible_figures() {
        let stats = sample_host();
        assert!(stats.ram_total > 0);
        assert!(stats.ram_used <= stats.ram_total);
        assert!((0.0..=100.0).contains(&stats.ram_percent));
        assert!(stats.disk_used <= stats.disk_total);
    }

    #[tokio::test]
    async fn unreachable_service_reports_offline() {
        // Port 9 (discard) is not serving HTTP
        let probe = SysinfoProbe::new("http://127.0.0.1:9");
        assert_eq!(probe.service_status().await, ServiceStatus::Offline);
    }
}
