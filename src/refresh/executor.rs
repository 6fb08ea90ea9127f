//! Reload execution seam.
//!
//! The actual configuration reload runs on a background task system owned by
//! the host. The orchestrator only sees a dispatch entry point and a handle
//! it can await, poll, or hand back to a deferred transport.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::fleet::ClusterId;

/// Maximum length of an error message surfaced to a caller.
pub const ERROR_MESSAGE_LIMIT: usize = 400;

/// Errors raised while dispatching or waiting on a reload.
#[derive(Debug, Clone, Error)]
pub enum ReloadError {
    /// The reload could not be handed to the task backend at all.
    #[error("DispatchError: {0}")]
    Dispatch(String),

    /// The task completed but reported a failure value.
    #[error("{class}: {message}")]
    Task {
        /// Failure class as reported by the worker.
        class: String,
        /// Failure message as reported by the worker.
        message: String,
    },

    /// The handle was lost before the task reported a result.
    #[error("HandleLost: {0}")]
    HandleLost(String),
}

impl ReloadError {
    /// Human-readable `class: message` summary with the message truncated to
    /// [`ERROR_MESSAGE_LIMIT`] characters, safe to attach to a response body
    /// or session error slot.
    pub fn summary(&self) -> String {
        let (class, message) = match self {
            ReloadError::Dispatch(msg) => ("DispatchError", msg.as_str()),
            ReloadError::Task { class, message } => (class.as_str(), message.as_str()),
            ReloadError::HandleLost(msg) => ("HandleLost", msg.as_str()),
        };
        let truncated: String = message.chars().take(ERROR_MESSAGE_LIMIT).collect();
        format!("{}: {}", class, truncated)
    }
}

/// Terminal result reported by a reload task.
///
/// A task backend may complete "successfully" while carrying a failure value;
/// callers must treat [`TaskResult::Failure`] exactly like a raised error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The reload applied; the value is backend-specific (e.g. new VCL id).
    Success(String),
    /// The reload ran but reported a failure.
    Failure {
        /// Failure class as reported by the worker.
        class: String,
        /// Failure message as reported by the worker.
        message: String,
    },
}

/// Handle to a dispatched reload running on the task backend.
#[async_trait]
pub trait ReloadHandle: Send + Sync {
    /// Externally visible task id.
    fn id(&self) -> Uuid;

    /// Whether the task has reached a terminal state.
    fn is_done(&self) -> bool;

    /// Await the terminal result. Must yield to the scheduler while the task
    /// runs; callers bound the wait with a timeout.
    async fn wait(&self) -> Result<TaskResult, ReloadError>;

    /// Polling location a deferred transport exposes via a `Location` header.
    fn polling_location(&self) -> String {
        format!("/task/{}/", self.id())
    }
}

/// Dispatches reloads to the background task system.
#[async_trait]
pub trait ReloadExecutor: Send + Sync {
    /// Dispatch one reload covering all given clusters.
    ///
    /// `timestamp` is the dispatch time in whole seconds since the epoch; the
    /// task backend uses it to order competing reloads.
    async fn dispatch(
        &self,
        timestamp: u64,
        clusters: Vec<ClusterId>,
    ) -> Result<Arc<dyn ReloadHandle>, ReloadError>;
}

/// Terminal outcome of one orchestration.
pub enum ReloadOutcome {
    /// The reload completed; carries the task's result value.
    Completed(String),
    /// The reload failed (raised or returned a failure value).
    Failed(ReloadError),
    /// The wait deadline expired; the task may still complete later.
    TimedOut,
    /// Deferred resolution: the caller polls the handle's location.
    Pending(Arc<dyn ReloadHandle>),
}

impl fmt::Debug for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadOutcome::Completed(value) => f.debug_tuple("Completed").field(value).finish(),
            ReloadOutcome::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            ReloadOutcome::TimedOut => write!(f, "TimedOut"),
            ReloadOutcome::Pending(handle) => {
                f.debug_tuple("Pending").field(&handle.id()).finish()
            }
        }
    }
}
