//! Metrics collection and exposition.
//!
//! # Metrics
//! - `explainer_requests_total` (counter): finished requests by outcome and status
//! - `explainer_request_duration_seconds` (histogram): end-to-end latency
//! - `explainer_rejections_total` (counter): requests refused before invocation, by reason
//! - `explainer_backend_attempts_total` (counter): backend calls by result
//! - `explainer_backend_duration_seconds` (histogram): per-attempt backend latency
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "explainer_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("explainer_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!("explainer_rejections_total", "reason" => reason).increment(1);
}

pub fn record_backend_attempt(result: &'static str, start: Instant) {
    counter!("explainer_backend_attempts_total", "result" => result).increment(1);
    histogram!("explainer_backend_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}
