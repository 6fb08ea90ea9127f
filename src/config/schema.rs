//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files; every
//! field has a default so minimal configs work.

use serde::{Deserialize, Serialize};

/// Root configuration for the fleet manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FleetConfig {
    /// Refresh orchestration settings.
    pub refresh: RefreshConfig,

    /// Status reconciliation settings.
    pub reconcile: ReconcileConfig,

    /// Status store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Refresh orchestration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Hard limit on a synchronous reload wait, in seconds. On expiry the
    /// wait is abandoned; the dispatched task keeps running.
    pub wait_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 300,
        }
    }
}

/// Status reconciliation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Enable the scheduled reconcile monitor.
    pub enabled: bool,

    /// Seconds between reconciliation passes.
    pub interval_secs: u64,

    /// Status label that marks a backend unhealthy. Any single instance
    /// reporting this label overrides healthy reports from the others.
    pub unhealthy_label: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            unhealthy_label: "Sick".to_string(),
        }
    }
}

/// Status store settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file path. When unset, statuses are kept in memory only.
    pub path: Option<String>,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
