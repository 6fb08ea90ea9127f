//! End-of-request reload orchestration.
//!
//! # Responsibilities
//! - Turn a consumed refresh set into exactly one batched dispatch
//! - Resolve the dispatch synchronously (bounded wait) or hand back a
//!   pending handle for deferred transports
//! - Keep the caller's session error slot free of stale messages
//!
//! # Design Decisions
//! - One dispatch covers all affected clusters; never one per cluster
//! - A timed-out wait is not an application error: the task keeps running
//!   and the response proceeds
//! - Deferred resolution is an explicit capability flag from the transport,
//!   never inferred from the response object

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::config::RefreshConfig;
use crate::fleet::ClusterId;
use crate::observability::metrics;
use crate::refresh::accumulator::RequestScope;
use crate::refresh::executor::{ReloadError, ReloadExecutor, ReloadOutcome, TaskResult};

/// How the transport wants the reload resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Block (cooperatively) until the reload finishes or the deadline hits.
    Blocking,
    /// The transport accepts deferred responses; return a pending handle and
    /// let the caller poll `/task/{id}/`.
    Deferred,
}

/// Session-scoped slot for the last soft reload error.
///
/// The orchestrator clears it on every synchronous resolution before
/// recording a new message, so stale errors never leak into a later response.
#[derive(Default)]
pub struct ErrorSlot {
    message: Mutex<Option<String>>,
}

impl ErrorSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, replacing any previous one.
    pub fn set(&self, message: impl Into<String>) {
        *self.message.lock().unwrap() = Some(message.into());
    }

    /// Clear the slot.
    pub fn clear(&self) {
        *self.message.lock().unwrap() = None;
    }

    /// Read the current message without clearing it.
    pub fn current(&self) -> Option<String> {
        self.message.lock().unwrap().clone()
    }
}

/// Dispatches at most one reload per request and resolves its outcome.
pub struct RefreshOrchestrator {
    executor: Arc<dyn ReloadExecutor>,
    wait_timeout: Duration,
}

impl RefreshOrchestrator {
    /// Create an orchestrator over the given task backend.
    pub fn new(executor: Arc<dyn ReloadExecutor>, config: &RefreshConfig) -> Self {
        Self {
            executor,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
        }
    }

    /// End-of-request hook: consume the scope's refresh set and resolve it.
    pub async fn complete_request(
        &self,
        scope: &RequestScope,
        mode: ResolutionMode,
        errors: &ErrorSlot,
    ) -> Option<ReloadOutcome> {
        self.resolve(scope.consume(), mode, errors).await
    }

    /// Resolve an already-consumed refresh set.
    ///
    /// Returns `None` when the set is empty: nothing is dispatched and the
    /// response path is unaffected.
    pub async fn resolve(
        &self,
        clusters: HashSet<ClusterId>,
        mode: ResolutionMode,
        errors: &ErrorSlot,
    ) -> Option<ReloadOutcome> {
        if clusters.is_empty() {
            return None;
        }

        let mut cluster_ids: Vec<ClusterId> = clusters.into_iter().collect();
        cluster_ids.sort();

        let started = Instant::now();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        tracing::info!(clusters = cluster_ids.len(), "dispatching cluster reload");

        let handle = match self.executor.dispatch(timestamp, cluster_ids).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(error = %err, "reload dispatch failed");
                errors.clear();
                errors.set(err.summary());
                metrics::record_reload_outcome("failed");
                Self::record_wait_duration(started);
                return Some(ReloadOutcome::Failed(err));
            }
        };

        if mode == ResolutionMode::Deferred {
            tracing::info!(
                task = %handle.id(),
                location = %handle.polling_location(),
                "reload deferred to task polling"
            );
            metrics::record_reload_outcome("pending");
            return Some(ReloadOutcome::Pending(handle));
        }

        let outcome = match tokio::time::timeout(self.wait_timeout, handle.wait()).await {
            Err(_) => {
                tracing::error!(
                    task = %handle.id(),
                    timeout_secs = self.wait_timeout.as_secs(),
                    "reload wait deadline reached; task left running"
                );
                ReloadOutcome::TimedOut
            }
            Ok(Err(err)) => ReloadOutcome::Failed(err),
            Ok(Ok(TaskResult::Failure { class, message })) => {
                // a failure value from a "successful" handle counts as raised
                ReloadOutcome::Failed(ReloadError::Task { class, message })
            }
            Ok(Ok(TaskResult::Success(value))) => ReloadOutcome::Completed(value),
        };

        errors.clear();
        match &outcome {
            ReloadOutcome::Completed(value) => {
                tracing::info!(task = %handle.id(), result = %value, "cluster reload completed");
                metrics::record_reload_outcome("completed");
            }
            ReloadOutcome::Failed(err) => {
                tracing::warn!(task = %handle.id(), error = %err, "cluster reload failed");
                errors.set(err.summary());
                metrics::record_reload_outcome("failed");
            }
            ReloadOutcome::TimedOut => {
                metrics::record_reload_outcome("timed_out");
            }
            ReloadOutcome::Pending(_) => unreachable!("pending is returned before the wait"),
        }

        Self::record_wait_duration(started);

        Some(outcome)
    }

    /// Record wall-clock time spent on the dispatch-and-wait path. Runs for
    /// every resolution, including ones that never reached the wait.
    fn record_wait_duration(started: Instant) {
        let elapsed = started.elapsed();
        metrics::record_reload_duration(elapsed);
        tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "cluster reload time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::refresh::executor::ReloadHandle;

    struct StaticHandle {
        id: Uuid,
        result: Result<TaskResult, ReloadError>,
    }

    #[async_trait]
    impl ReloadHandle for StaticHandle {
        fn id(&self) -> Uuid {
            self.id
        }

        fn is_done(&self) -> bool {
            true
        }

        async fn wait(&self) -> Result<TaskResult, ReloadError> {
            self.result.clone()
        }
    }

    struct NeverHandle {
        id: Uuid,
    }

    #[async_trait]
    impl ReloadHandle for NeverHandle {
        fn id(&self) -> Uuid {
            self.id
        }

        fn is_done(&self) -> bool {
            false
        }

        async fn wait(&self) -> Result<TaskResult, ReloadError> {
            std::future::pending().await
        }
    }

    enum Behavior {
        Complete(TaskResult),
        RefuseDispatch,
        NeverFinish,
    }

    struct MockExecutor {
        behavior: Behavior,
        dispatches: Mutex<Vec<(u64, Vec<ClusterId>)>>,
    }

    impl MockExecutor {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                dispatches: Mutex::new(Vec::new()),
            })
        }

        fn dispatch_count(&self) -> usize {
            self.dispatches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReloadExecutor for MockExecutor {
        async fn dispatch(
            &self,
            timestamp: u64,
            clusters: Vec<ClusterId>,
        ) -> Result<Arc<dyn ReloadHandle>, ReloadError> {
            self.dispatches
                .lock()
                .unwrap()
                .push((timestamp, clusters));
            match &self.behavior {
                Behavior::RefuseDispatch => {
                    Err(ReloadError::Dispatch("broker unavailable".into()))
                }
                Behavior::Complete(result) => Ok(Arc::new(StaticHandle {
                    id: Uuid::new_v4(),
                    result: Ok(result.clone()),
                })),
                Behavior::NeverFinish => Ok(Arc::new(NeverHandle { id: Uuid::new_v4() })),
            }
        }
    }

    fn orchestrator(executor: Arc<MockExecutor>, timeout_secs: u64) -> RefreshOrchestrator {
        let config = RefreshConfig {
            wait_timeout_secs: timeout_secs,
        };
        RefreshOrchestrator::new(executor, &config)
    }

    fn set(raw: &[u64]) -> HashSet<ClusterId> {
        raw.iter().copied().map(ClusterId).collect()
    }

    #[tokio::test]
    async fn test_empty_set_skips_dispatch() {
        let executor = MockExecutor::new(Behavior::Complete(TaskResult::Success("ok".into())));
        let orch = orchestrator(Arc::clone(&executor), 5);
        let errors = ErrorSlot::new();

        let outcome = orch
            .resolve(HashSet::new(), ResolutionMode::Blocking, &errors)
            .await;

        assert!(outcome.is_none());
        assert_eq!(executor.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn test_single_batched_dispatch() {
        let executor = MockExecutor::new(Behavior::Complete(TaskResult::Success("ok".into())));
        let orch = orchestrator(Arc::clone(&executor), 5);
        let errors = ErrorSlot::new();

        let outcome = orch
            .resolve(set(&[3, 1, 2]), ResolutionMode::Blocking, &errors)
            .await
            .unwrap();

        assert!(matches!(outcome, ReloadOutcome::Completed(ref v) if v == "ok"));
        let dispatches = executor.dispatches.lock().unwrap();
        assert_eq!(dispatches.len(), 1);
        assert_eq!(
            dispatches[0].1,
            vec![ClusterId(1), ClusterId(2), ClusterId(3)]
        );
    }

    #[tokio::test]
    async fn test_success_clears_stale_error() {
        let executor = MockExecutor::new(Behavior::Complete(TaskResult::Success("ok".into())));
        let orch = orchestrator(executor, 5);
        let errors = ErrorSlot::new();
        errors.set("VclLoadError: previous failure");

        orch.resolve(set(&[1]), ResolutionMode::Blocking, &errors)
            .await;

        assert!(errors.current().is_none());
    }

    #[tokio::test]
    async fn test_failure_value_surfaces_as_failed() {
        let executor = MockExecutor::new(Behavior::Complete(TaskResult::Failure {
            class: "VclLoadError".into(),
            message: "compile error".into(),
        }));
        let orch = orchestrator(executor, 5);
        let errors = ErrorSlot::new();
        errors.set("stale message");

        let outcome = orch
            .resolve(set(&[1]), ResolutionMode::Blocking, &errors)
            .await
            .unwrap();

        assert!(matches!(outcome, ReloadOutcome::Failed(_)));
        assert_eq!(
            errors.current().as_deref(),
            Some("VclLoadError: compile error")
        );
    }

    #[derive(Default)]
    struct CaptureState {
        histograms: Mutex<Vec<(String, f64)>>,
    }

    struct CaptureRecorder(Arc<CaptureState>);

    struct CaptureHistogram {
        name: String,
        state: Arc<CaptureState>,
    }

    impl ::metrics::HistogramFn for CaptureHistogram {
        fn record(&self, value: f64) {
            self.state
                .histograms
                .lock()
                .unwrap()
                .push((self.name.clone(), value));
        }
    }

    impl ::metrics::Recorder for CaptureRecorder {
        fn describe_counter(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn describe_gauge(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn describe_histogram(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn register_counter(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Counter {
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(
            &self,
            key: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Histogram {
            ::metrics::Histogram::from_arc(Arc::new(CaptureHistogram {
                name: key.name().to_string(),
                state: Arc::clone(&self.0),
            }))
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_records_error() {
        let executor = MockExecutor::new(Behavior::RefuseDispatch);
        let orch = orchestrator(executor, 5);
        let errors = ErrorSlot::new();

        let outcome = orch
            .resolve(set(&[1]), ResolutionMode::Blocking, &errors)
            .await
            .unwrap();

        assert!(matches!(outcome, ReloadOutcome::Failed(_)));
        assert_eq!(
            errors.current().as_deref(),
            Some("DispatchError: broker unavailable")
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_still_records_duration() {
        let state = Arc::new(CaptureState::default());
        let recorder = CaptureRecorder(Arc::clone(&state));
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let executor = MockExecutor::new(Behavior::RefuseDispatch);
        let orch = orchestrator(executor, 5);
        let errors = ErrorSlot::new();

        orch.resolve(set(&[1]), ResolutionMode::Blocking, &errors)
            .await;

        let histograms = state.histograms.lock().unwrap();
        assert!(
            histograms
                .iter()
                .any(|(name, _)| name == "fleet_reload_duration_seconds"),
            "resolution duration must be recorded even when dispatch is refused"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_yields_timed_out() {
        let executor = MockExecutor::new(Behavior::NeverFinish);
        let orch = orchestrator(Arc::clone(&executor), 2);
        let errors = ErrorSlot::new();

        let outcome = orch
            .resolve(set(&[1]), ResolutionMode::Blocking, &errors)
            .await
            .unwrap();

        assert!(matches!(outcome, ReloadOutcome::TimedOut));
        // a timeout is recorded, not surfaced as an application error
        assert!(errors.current().is_none());
        assert_eq!(executor.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn test_deferred_mode_returns_pending() {
        let executor = MockExecutor::new(Behavior::NeverFinish);
        let orch = orchestrator(executor, 5);
        let errors = ErrorSlot::new();

        let outcome = orch
            .resolve(set(&[1, 2]), ResolutionMode::Deferred, &errors)
            .await
            .unwrap();

        match outcome {
            ReloadOutcome::Pending(handle) => {
                assert!(!handle.is_done());
                assert_eq!(handle.polling_location(), format!("/task/{}/", handle.id()));
            }
            other => panic!("expected pending outcome, got {:?}", other),
        }
    }
}
