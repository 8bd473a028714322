//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by resolving stage and status
//! - `proxy_request_duration_seconds` (histogram): time to response head, by stage
//! - `proxy_upstream_errors_total` (counter): pass-through failures by kind
//!
//! # Design Decisions
//! - Recording is always on and cheap; without an installed recorder it is a no-op
//! - Prometheus exposition is opt-in via `observability.metrics_enabled`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a dispatched request.
pub fn record_request(stage: &'static str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "stage" => stage,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "stage" => stage)
        .record(start.elapsed().as_secs_f64());
}

/// Record a pass-through failure.
pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
