//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): gateway requests by outcome, status
//! - `relay_request_duration_seconds` (histogram): latency by outcome
//! - `relay_rate_limited_total` (counter): admission denials by scope
//! - `relay_cache_lookups_total` (counter): cache hits and misses
//! - `relay_cache_entries` (gauge): entries currently held
//! - `relay_upstream_failures_total` (counter): classified fetch failures

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!("relay_requests_total", "outcome" => outcome, "status" => status.to_string())
        .increment(1);
    histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("relay_rate_limited_total", "scope" => scope).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("relay_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("relay_cache_entries").set(entries as f64);
}

pub fn record_upstream_failure(kind: &'static str) {
    counter!("relay_upstream_failures_total", "kind" => kind).increment(1);
}
