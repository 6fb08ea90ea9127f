//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fleet_reloads_total` (counter): reload dispatches by outcome
//! - `fleet_reload_duration_seconds` (histogram): synchronous wait time
//! - `fleet_reconcile_passes_total` (counter): completed reconciliation passes
//! - `fleet_instance_fetch_failures_total` (counter): unreachable instances
//! - `fleet_backends_observed` (gauge): backends seen in the latest pass
//! - `fleet_backend_health` (gauge): 1=healthy, 0=unhealthy, per endpoint

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::reconcile::ReconcileSummary;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record the terminal outcome of one orchestration.
pub fn record_reload_outcome(outcome: &'static str) {
    counter!("fleet_reloads_total", "outcome" => outcome).increment(1);
}

/// Record wall-clock time spent waiting on a reload.
pub fn record_reload_duration(elapsed: Duration) {
    histogram!("fleet_reload_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record the health of one backend endpoint as observed by the fleet.
pub fn record_backend_health(endpoint: &str, healthy: bool) {
    gauge!("fleet_backend_health", "backend" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Record counters for one completed reconciliation pass.
pub fn record_reconcile_pass(summary: &ReconcileSummary) {
    counter!("fleet_reconcile_passes_total").increment(1);
    counter!("fleet_instance_fetch_failures_total").increment(summary.instances_failed as u64);
    gauge!("fleet_backends_observed").set(summary.backends_observed as f64);
}
