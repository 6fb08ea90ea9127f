//! Scheduled reconciliation driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::ReconcileConfig;
use crate::reconcile::reconciler::StatusReconciler;

/// Runs reconciliation passes on a fixed interval until shutdown.
pub struct ReconcileMonitor {
    reconciler: Arc<StatusReconciler>,
    enabled: bool,
    interval: Duration,
}

impl ReconcileMonitor {
    /// Create a monitor over the given reconciler.
    pub fn new(reconciler: Arc<StatusReconciler>, config: &ReconcileConfig) -> Self {
        Self {
            reconciler,
            enabled: config.enabled,
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Run the monitor loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            tracing::info!("status reconciliation disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "status reconcile monitor starting"
        );

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.reconciler.run_pass().await {
                        tracing::error!(error = %e, "reconciliation pass failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("reconcile monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
