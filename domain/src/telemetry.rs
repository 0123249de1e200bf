//! Host telemetry value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
    Offline,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Online => f.write_str("online"),
            ServiceStatus::Offline => f.write_str("offline"),
        }
    }
}

/// One sample of host resource usage and service status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub ram_total: u64,
    pub ram_used: u64,
    pub ram_percent: f32,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_percent: f32,
    /// Host uptime in seconds.
    pub uptime: u64,
    pub service_status: ServiceStatus,
}

impl SystemStats {
    /// A zeroed sample with the service reported offline.
    ///
    /// Used as the initial value before the first poll completes.
    pub fn empty() -> Self {
        Self {
            cpu_percent: 0.0,
            ram_total: 0,
            ram_used: 0,
            ram_percent: 0.0,
            disk_total: 0,
            disk_used: 0,
            disk_percent: 0.0,
            uptime: 0,
            service_status: ServiceStatus::Offline,
        }
    }
}
