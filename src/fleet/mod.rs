//! Fleet domain types and external collaborator seams.
//!
//! # Responsibilities
//! - Identify clusters and backends across the fleet
//! - Define the read-only directory the reconciler loads backends from
//! - Define the per-instance status source the reconciler fans out to
//!
//! # Design Decisions
//! - Collaborators are object-safe async traits so hosts can plug in their
//!   entity store and admin-protocol client
//! - A backend is identified externally by (address, port); the numeric id a
//!   proxy instance uses internally is only valid through the directory

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a cluster (a named group of proxy instances sharing
/// configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl From<u64> for ClusterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ClusterId> for u64 {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric backend id as used inside a proxy instance's configuration.
///
/// Only meaningful when resolved through a [`BackendDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendId(pub u64);

impl From<u64> for BackendId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network endpoint of a backend, independent of any instance-local id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendKey {
    /// Backend address (hostname or IP).
    pub address: String,
    /// Backend port.
    pub port: u16,
}

impl BackendKey {
    /// Create a new backend key.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for BackendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Errors raised while talking to a single proxy instance.
///
/// These are always isolated to the instance that raised them; a
/// reconciliation pass continues with the remaining instances.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// The instance could not be reached at all.
    #[error("instance unreachable: {0}")]
    Unreachable(String),

    /// The instance answered but the status dump could not be retrieved.
    #[error("status fetch failed: {0}")]
    Fetch(String),
}

/// Read-only view of all configured backends, keyed by instance-local id.
#[async_trait]
pub trait BackendDirectory: Send + Sync {
    /// Load the full backend-id to endpoint mapping.
    async fn all(&self) -> HashMap<BackendId, BackendKey>;
}

/// A connected proxy instance that can report the health of its backends.
#[async_trait]
pub trait ProxyInstance: Send + Sync {
    /// Instance name for logging.
    fn name(&self) -> &str;

    /// Fetch the raw status dump, one line per backend.
    async fn fetch_status_dump(&self) -> Result<String, InstanceError>;
}

/// Enumerates the proxy instances that are currently reachable.
#[async_trait]
pub trait ProxyStatusSource: Send + Sync {
    /// List connected instances. Instances that fail to connect are simply
    /// absent from the result.
    async fn connected_instances(&self) -> Vec<Arc<dyn ProxyInstance>>;
}
