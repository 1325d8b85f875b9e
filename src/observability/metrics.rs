//! Metrics collection and exposition.
//!
//! # Metrics
//! - `management_requests_total` (counter): served requests by method, status
//! - `management_requests_rejected_total` (counter): requests refused while draining
//! - `management_request_duration_seconds` (histogram): latency distribution
//! - `management_active_requests` (gauge): requests currently admitted

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "management_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "management_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rejected(method: &str) {
    metrics::counter!("management_requests_rejected_total", "method" => method.to_string()).increment(1);
}

pub fn set_active_requests(count: usize) {
    metrics::gauge!("management_active_requests").set(count as f64);
}
