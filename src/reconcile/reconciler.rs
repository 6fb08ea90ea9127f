//! Fleet-wide backend status reconciliation.
//!
//! # Responsibilities
//! - Poll every reachable proxy instance for its backend status dump
//! - Resolve conflicting reports for the same endpoint
//! - Merge the result into the status store with timestamp-monotonic upserts
//! - Prune records no instance reaffirmed in this pass
//!
//! # Design Decisions
//! - The pass timestamp is read once, in whole seconds; it is the pass's
//!   identity for both conflict resolution and pruning
//! - One failing observer is enough to mark a backend suspect: the unhealthy
//!   label overrides any healthy report, regardless of arrival order
//! - Per-line and per-instance failures are logged and isolated; only store
//!   errors abort a pass

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::ReconcileConfig;
use crate::fleet::{BackendDirectory, BackendKey, ProxyStatusSource};
use crate::observability::metrics;
use crate::reconcile::parser::parse_status_line;
use crate::store::{BackendStatusRecord, StatusStore, StoreError};

/// Counters describing one completed reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// The pass timestamp (whole seconds since the epoch).
    pub timestamp: u64,
    /// Instances whose dump was fetched and parsed.
    pub instances_polled: usize,
    /// Instances that could not be fetched this pass.
    pub instances_failed: usize,
    /// Distinct backend endpoints observed.
    pub backends_observed: usize,
    /// Records deleted by the pruning step.
    pub records_pruned: usize,
}

/// Polls the fleet and reconciles backend health into the status store.
pub struct StatusReconciler {
    directory: Arc<dyn BackendDirectory>,
    source: Arc<dyn ProxyStatusSource>,
    store: Arc<dyn StatusStore>,
    unhealthy_label: String,
}

impl StatusReconciler {
    /// Create a reconciler over the given collaborators.
    pub fn new(
        directory: Arc<dyn BackendDirectory>,
        source: Arc<dyn ProxyStatusSource>,
        store: Arc<dyn StatusStore>,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            directory,
            source,
            store,
            unhealthy_label: config.unhealthy_label.clone(),
        }
    }

    /// Run one complete poll-and-merge pass.
    pub async fn run_pass(&self) -> Result<ReconcileSummary, StoreError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let backends = self.directory.all().await;
        let instances = self.source.connected_instances().await;

        let mut observed: HashMap<BackendKey, String> = HashMap::new();
        let mut instances_polled = 0;
        let mut instances_failed = 0;

        for instance in &instances {
            match instance.fetch_status_dump().await {
                Ok(dump) => {
                    instances_polled += 1;
                    for line in dump.lines() {
                        let Some(raw) = parse_status_line(line) else {
                            continue;
                        };
                        match backends.get(&raw.backend_id) {
                            Some(key) => self.observe(&mut observed, key.clone(), raw.status),
                            None => {
                                // orphan reference: the instance still names a
                                // backend the directory no longer knows
                                tracing::debug!(
                                    instance = instance.name(),
                                    backend_id = %raw.backend_id,
                                    "status line references unmapped backend, ignoring"
                                );
                            }
                        }
                    }
                }
                Err(err) => {
                    instances_failed += 1;
                    tracing::warn!(
                        instance = instance.name(),
                        error = %err,
                        "backend statuses could not be refreshed from instance"
                    );
                }
            }
        }

        // merge as one batch, then prune everything older than this pass
        for (key, status) in &observed {
            metrics::record_backend_health(&key.to_string(), status != &self.unhealthy_label);
            match self.store.get(key).await? {
                Some(existing) if existing.timestamp >= timestamp => {
                    // a later-started pass already superseded this observation
                }
                _ => {
                    self.store
                        .upsert(BackendStatusRecord {
                            address: key.address.clone(),
                            port: key.port,
                            status: status.clone(),
                            timestamp,
                        })
                        .await?;
                }
            }
        }

        let records_pruned = self.store.delete_older_than(timestamp).await?;

        let summary = ReconcileSummary {
            timestamp,
            instances_polled,
            instances_failed,
            backends_observed: observed.len(),
            records_pruned,
        };
        metrics::record_reconcile_pass(&summary);
        tracing::info!(
            timestamp = summary.timestamp,
            instances_polled = summary.instances_polled,
            instances_failed = summary.instances_failed,
            backends_observed = summary.backends_observed,
            records_pruned = summary.records_pruned,
            "reconciliation pass finished"
        );
        Ok(summary)
    }

    /// Record one observation, resolving conflicts within the pass.
    ///
    /// First observation wins, except that the unhealthy label always
    /// overrides whatever is already recorded.
    fn observe(&self, observed: &mut HashMap<BackendKey, String>, key: BackendKey, status: String) {
        match observed.entry(key) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(status);
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if status == self.unhealthy_label {
                    entry.insert(status);
                }
            }
        }
    }
}
