//! Backend health reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! ReconcileMonitor (interval tick)
//!     → StatusReconciler::run_pass
//!         snapshot pass timestamp (whole seconds)
//!         load backend-id → endpoint mapping
//!         for each connected instance: fetch dump → parse lines
//!             conflict rule: first wins, unhealthy always overrides
//!         merge batch into StatusStore (timestamp-monotonic upserts)
//!         prune records older than the pass timestamp
//! ```

pub mod monitor;
pub mod parser;
pub mod reconciler;

pub use monitor::ReconcileMonitor;
pub use parser::{parse_status_line, RawStatusLine};
pub use reconciler::{ReconcileSummary, StatusReconciler};
