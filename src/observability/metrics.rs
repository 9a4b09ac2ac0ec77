//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_proxy_requests_total` (counter): forwarded requests by method, status, target
//! - `edge_proxy_request_duration_seconds` (histogram): time to upstream response head
//! - `edge_proxy_upstream_errors_total` (counter): failed forwards by kind
//! - `edge_guard_decisions_total` (counter): guard outcomes
//! - `edge_session_checks_total` (counter): session check outcomes
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_proxy_request(method: &str, status: u16, target: &'static str, start: Instant) {
    counter!(
        "edge_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target
    )
    .increment(1);
    histogram!("edge_proxy_request_duration_seconds", "target" => target)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("edge_proxy_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_guard_decision(decision: &'static str) {
    counter!("edge_guard_decisions_total", "decision" => decision).increment(1);
}

pub fn record_session_check(outcome: &'static str) {
    counter!("edge_session_checks_total", "outcome" => outcome).increment(1);
}
