//! Refresh signal accumulation and reload orchestration.
//!
//! # Data Flow
//! ```text
//! request start
//!     → RefreshAccumulator::begin (RequestScope guard)
//!     → operations signal clusters needing a reload (union per scope)
//! request end
//!     → RequestScope::consume (get-and-clear)
//!     → RefreshOrchestrator::resolve
//!         empty set  → no dispatch
//!         otherwise  → exactly one ReloadExecutor::dispatch
//!             Blocking → bounded wait → Completed/Failed/TimedOut
//!             Deferred → Pending(handle), caller polls /task/{id}/
//! ```

pub mod accumulator;
pub mod executor;
pub mod orchestrator;

pub use accumulator::{RefreshAccumulator, RequestScope};
pub use executor::{ReloadError, ReloadExecutor, ReloadHandle, ReloadOutcome, TaskResult};
pub use orchestrator::{ErrorSlot, RefreshOrchestrator, ResolutionMode};
