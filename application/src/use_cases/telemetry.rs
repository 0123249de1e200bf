//! Telemetry poller — periodic host/service sampling.
//!
//! Runs on its own fixed-interval task, fully decoupled from session
//! state. Samples are published through a `watch` channel; dropping the
//! handle stops the task.

use crate::ports::telemetry::TelemetryProbe;
use braid_domain::SystemStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct TelemetryPoller {
    probe: Arc<dyn TelemetryProbe>,
    interval: Duration,
}

/// Live handle to a running poller. Dropping it cancels the task.
pub struct TelemetryHandle {
    receiver: watch::Receiver<SystemStats>,
    cancel: CancellationToken,
}

impl TelemetryHandle {
    /// The most recent sample.
    pub fn latest(&self) -> SystemStats {
        self.receiver.borrow().clone()
    }

    /// Wait until a fresh sample has been published.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

impl Drop for TelemetryHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl TelemetryPoller {
    pub fn new(probe: Arc<dyn TelemetryProbe>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Start sampling on an independent task.
    pub fn spawn(self) -> TelemetryHandle {
        let (tx, rx) = watch::channel(SystemStats::empty());
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!("telemetry poller stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let stats = self.probe.sample().await;
                        if tx.send(stats).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        TelemetryHandle {
            receiver: rx,
            cancel,
        }
    }
}
