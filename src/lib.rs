//! Fleet management core for cache-proxy clusters.
//!
//! Keeps the running configuration of a fleet of cache-proxy instances
//! consistent with desired state, and keeps a persistent view of live backend
//! health across the fleet.
//!
//! # Architecture Overview
//!
//! ```text
//! inbound request
//!     → RequestScope (one per request, guard-scoped)
//!     → operations signal clusters to refresh        refresh/
//!     → end of request: consume set, dispatch once   refresh/orchestrator
//!         → ReloadExecutor (host task backend)
//!
//! scheduled
//!     → ReconcileMonitor ticks                       reconcile/monitor
//!     → StatusReconciler polls every instance        reconcile/
//!         → ProxyStatusSource / BackendDirectory     fleet/
//!         → StatusStore merge + prune                store/
//!
//! cross-cutting: config/, observability/, lifecycle/
//! ```
//!
//! External collaborators (entity store, task backend, proxy admin client,
//! HTTP transport) are trait seams in [`fleet`] and [`refresh::executor`];
//! hosts provide the implementations.

// Core subsystems
pub mod config;
pub mod fleet;
pub mod reconcile;
pub mod refresh;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::FleetConfig;
pub use fleet::{BackendDirectory, BackendId, BackendKey, ClusterId, ProxyStatusSource};
pub use lifecycle::Shutdown;
pub use reconcile::{ReconcileMonitor, StatusReconciler};
pub use refresh::{
    ErrorSlot, RefreshAccumulator, RefreshOrchestrator, ReloadOutcome, RequestScope,
    ResolutionMode,
};
pub use store::{BackendStatusRecord, FileStatusStore, MemoryStatusStore, StatusStore};
