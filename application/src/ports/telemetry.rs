//! Telemetry probe port

use async_trait::async_trait;
use braid_domain::SystemStats;

/// Samples host resource usage and inference-service reachability.
///
/// Infallible by contract: an unreachable service is reported through
/// [`SystemStats::service_status`], not as an error.
#[async_trait]
pub trait TelemetryProbe: Send + Sync {
    async fn sample(&self) -> SystemStats;
}
