//! Persistent "last known status" storage for backends.
//!
//! # Responsibilities
//! - Hold one [`BackendStatusRecord`] per backend endpoint
//! - Support the reconciler's read-modify-write merge and staleness pruning
//!
//! # Design Decisions
//! - Timestamps are whole seconds since the epoch; a record is the product of
//!   exactly one reconciliation pass and carries that pass's timestamp
//! - The store itself does not order writes; the reconciler's timestamp check
//!   is what makes concurrent passes safe

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fleet::BackendKey;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;

/// Last known status of one backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatusRecord {
    /// Backend address.
    pub address: String,
    /// Backend port.
    pub port: u16,
    /// Status label as reported by the proxy instances (e.g. `Healthy`,
    /// `Sick`).
    pub status: String,
    /// Timestamp of the reconciliation pass that last affirmed this record,
    /// in whole seconds since the epoch.
    pub timestamp: u64,
}

impl BackendStatusRecord {
    /// The endpoint this record describes.
    pub fn key(&self) -> BackendKey {
        BackendKey::new(self.address.clone(), self.port)
    }
}

/// Errors raised by a status store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (file stores).
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contract the reconciler merges into.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Fetch the record for an endpoint, if any.
    async fn get(&self, key: &BackendKey) -> Result<Option<BackendStatusRecord>, StoreError>;

    /// Insert or replace the record for the record's endpoint.
    async fn upsert(&self, record: BackendStatusRecord) -> Result<(), StoreError>;

    /// Delete every record with a timestamp strictly older than `timestamp`.
    /// Returns the number of records removed.
    async fn delete_older_than(&self, timestamp: u64) -> Result<usize, StoreError>;

    /// All current records, in no particular order.
    async fn snapshot(&self) -> Result<Vec<BackendStatusRecord>, StoreError>;
}
