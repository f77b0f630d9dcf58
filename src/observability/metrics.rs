//! Metrics collection and exposition.
//!
//! # Metrics
//! - `jobportal_client_requests_total` (counter): dispatches by method, status
//! - `jobportal_client_request_duration_seconds` (histogram): latency by method
//! - `jobportal_client_gate_rejections_total` (counter): local refusals by reason
//! - `jobportal_client_circuit_opened_total` (counter)
//! - `jobportal_client_retries_total` (counter): retries by reason
//! - `jobportal_client_token_refresh_total` (counter): refreshes by outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed dispatch. `status` is 0 when no response arrived.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "jobportal_client_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "jobportal_client_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_gate_rejection(reason: &'static str) {
    counter!("jobportal_client_gate_rejections_total", "reason" => reason).increment(1);
}

pub fn record_circuit_opened() {
    counter!("jobportal_client_circuit_opened_total").increment(1);
}

pub fn record_retry(reason: &'static str) {
    counter!("jobportal_client_retries_total", "reason" => reason).increment(1);
}

pub fn record_token_refresh(outcome: &'static str) {
    counter!("jobportal_client_token_refresh_total", "outcome" => outcome).increment(1);
}
