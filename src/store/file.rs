//! JSON-file-persisted status store.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::fleet::BackendKey;
use crate::store::{BackendStatusRecord, StatusStore, StoreError};

/// Store that mirrors every mutation to a JSON snapshot on disk.
///
/// Reads are served from memory; the snapshot is rewritten after each
/// mutation so a restart picks up the last reconciled state.
pub struct FileStatusStore {
    records: DashMap<BackendKey, BackendStatusRecord>,
    path: PathBuf,
}

impl FileStatusStore {
    /// Open a store at `path`, loading the existing snapshot if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = DashMap::new();

        if path.exists() {
            let file = File::open(&path)?;
            let reader = BufReader::new(file);
            let loaded: Vec<BackendStatusRecord> = serde_json::from_reader(reader)?;
            for record in loaded {
                records.insert(record.key(), record);
            }
            tracing::info!(
                path = %path.display(),
                records = records.len(),
                "loaded backend status snapshot"
            );
        }

        Ok(Self { records, path })
    }

    fn save(&self) -> Result<(), StoreError> {
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        let snapshot: Vec<BackendStatusRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        serde_json::to_writer(writer, &snapshot)?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn get(&self, key: &BackendKey) -> Result<Option<BackendStatusRecord>, StoreError> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn upsert(&self, record: BackendStatusRecord) -> Result<(), StoreError> {
        self.records.insert(record.key(), record);
        self.save()
    }

    async fn delete_older_than(&self, timestamp: u64) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, record| record.timestamp >= timestamp);
        let removed = before - self.records.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    async fn snapshot(&self) -> Result<Vec<BackendStatusRecord>, StoreError> {
        Ok(self.records.iter().map(|r| r.value().clone()).collect())
    }
}
