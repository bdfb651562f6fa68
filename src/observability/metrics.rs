//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_invocations_total` (counter): invocations by route, outcome
//! - `proxy_invocation_duration_seconds` (histogram): invocation latency by route
//! - `proxy_requests_total` (counter): inbound requests by method, status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_routes_loaded` (gauge): size of the active route table
//!
//! Updates are no-ops until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_invocation(route: &str, outcome: &'static str, start: Instant) {
    let route = route.to_string();
    metrics::counter!("proxy_invocations_total", "route" => route.clone(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("proxy_invocation_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn set_routes_loaded(count: usize) {
    metrics::gauge!("proxy_routes_loaded").set(count as f64);
}
