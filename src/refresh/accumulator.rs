//! Per-request accumulation of cluster refresh signals.
//!
//! # Responsibilities
//! - Merge refresh signals raised during one request into a single set
//! - Hand the set out exactly once (get-and-clear)
//! - Keep concurrent requests fully isolated from each other
//!
//! # Design Decisions
//! - The map is injected shared state, not a process-wide static; entries are
//!   created when a [`RequestScope`] is opened and removed when it drops, so
//!   early-exit paths cannot leak entries
//! - DashMap gives per-shard locking; operations on distinct scope ids never
//!   contend

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::fleet::ClusterId;

/// Concurrency-safe store of pending refresh sets, keyed by request
/// correlation id.
#[derive(Default)]
pub struct RefreshAccumulator {
    pending: DashMap<String, HashSet<ClusterId>>,
}

impl RefreshAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Open a scope for one inbound request.
    ///
    /// The returned guard removes the scope's entry when dropped, whether or
    /// not it was consumed.
    pub fn begin(self: &Arc<Self>, request_id: impl Into<String>) -> RequestScope {
        let id = request_id.into();
        self.pending.entry(id.clone()).or_default();
        tracing::debug!(request_id = %id, "refresh scope opened");
        RequestScope {
            id,
            accumulator: Arc::clone(self),
        }
    }

    /// Merge `clusters` into the scope's pending set (union, not replace).
    ///
    /// Signals for an unknown scope id open the entry implicitly; whether the
    /// scope was registered first makes no difference to the merged result.
    pub fn signal<I>(&self, request_id: &str, clusters: I)
    where
        I: IntoIterator<Item = ClusterId>,
    {
        let mut entry = self.pending.entry(request_id.to_string()).or_default();
        entry.extend(clusters);
        tracing::debug!(
            request_id = %request_id,
            pending = entry.len(),
            "refresh signal merged"
        );
    }

    /// Atomically read and clear the scope's pending set.
    ///
    /// Returns the empty set if nothing was signaled, or if the set was
    /// already consumed and no new signal arrived since.
    pub fn consume(&self, request_id: &str) -> HashSet<ClusterId> {
        let clusters = self
            .pending
            .remove(request_id)
            .map(|(_, set)| set)
            .unwrap_or_default();
        tracing::debug!(
            request_id = %request_id,
            clusters = clusters.len(),
            "refresh set consumed"
        );
        clusters
    }

    /// Number of scopes currently holding a pending entry.
    pub fn open_scopes(&self) -> usize {
        self.pending.len()
    }
}

/// Guard tying a pending refresh set to the lifetime of one request.
pub struct RequestScope {
    id: String,
    accumulator: Arc<RefreshAccumulator>,
}

impl RequestScope {
    /// The request correlation id this scope belongs to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Merge `clusters` into this scope's pending set.
    pub fn signal<I>(&self, clusters: I)
    where
        I: IntoIterator<Item = ClusterId>,
    {
        self.accumulator.signal(&self.id, clusters);
    }

    /// Read and clear this scope's pending set.
    pub fn consume(&self) -> HashSet<ClusterId> {
        self.accumulator.consume(&self.id)
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.accumulator.pending.remove(&self.id).is_some() {
            tracing::debug!(request_id = %self.id, "unconsumed refresh scope discarded");
        }
    }
}
