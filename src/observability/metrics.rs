//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by route, status
//! - `proxy_request_duration_seconds` (histogram): inbound latency
//! - `proxy_selections_total` (counter): selection outcomes by strategy, service
//! - `proxy_upstream_requests_total` (counter): forwarded calls by host, status
//! - `proxy_upstream_duration_seconds` (histogram): forwarding latency by host
//! - `proxy_forward_attempts_total` (counter): individual attempts by outcome
//! - `proxy_cache_lookups_total` (counter): cache hits and misses
//! - `proxy_cache_entries` (gauge): cached hosts
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::load_balancer::host::Host;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one inbound request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one selection round.
pub fn record_selection(strategy: &'static str, service: &str, outcome: &'static str) {
    counter!(
        "proxy_selections_total",
        "strategy" => strategy,
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a completed forwarding call, cache hits excluded.
pub fn record_forward(host: &Host, status: u16, start: Instant) {
    let host = host.to_string();
    counter!(
        "proxy_upstream_requests_total",
        "host" => host.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_upstream_duration_seconds", "host" => host)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(outcome: &'static str) {
    counter!("proxy_forward_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("proxy_cache_entries").set(entries as f64);
}
