//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_dispatch_total` (counter): dispatched requests by outcome, status
//! - `mock_dispatch_duration_seconds` (histogram): dispatch latency
//! - `mock_admin_operations_total` (counter): admin calls by operation
//! - `mock_store_write_failures_total` (counter): failed persistence writes
//! - `mock_origin_rejected_total` (counter): requests refused by the origin gate

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(outcome: &'static str, status: u16, start_time: Instant) {
    ::metrics::counter!(
        "mock_dispatch_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("mock_dispatch_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_admin_operation(operation: &'static str) {
    ::metrics::counter!("mock_admin_operations_total", "op" => operation).increment(1);
}

pub fn record_persistence_failure() {
    ::metrics::counter!("mock_store_write_failures_total").increment(1);
}

pub fn record_origin_rejected() {
    ::metrics::counter!("mock_origin_rejected_total").increment(1);
}
