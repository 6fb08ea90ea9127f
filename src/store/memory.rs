//! In-memory status store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::fleet::BackendKey;
use crate::store::{BackendStatusRecord, StatusStore, StoreError};

/// DashMap-backed store. The default for tests and for hosts that keep the
/// status table in a shared cache rather than on disk.
#[derive(Default)]
pub struct MemoryStatusStore {
    records: DashMap<BackendKey, BackendStatusRecord>,
}

impl MemoryStatusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn get(&self, key: &BackendKey) -> Result<Option<BackendStatusRecord>, StoreError> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn upsert(&self, record: BackendStatusRecord) -> Result<(), StoreError> {
        self.records.insert(record.key(), record);
        Ok(())
    }

    async fn delete_older_than(&self, timestamp: u64) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, record| record.timestamp >= timestamp);
        Ok(before - self.records.len())
    }

    async fn snapshot(&self) -> Result<Vec<BackendStatusRecord>, StoreError> {
        Ok(self.records.iter().map(|r| r.value().clone()).collect())
    }
}
