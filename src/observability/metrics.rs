//! Metrics exposition.
//!
//! # Responsibilities
//! - Install the Prometheus exporter
//! - Provide typed recording helpers for gateway events
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched requests by service, outcome
//! - `gateway_request_duration_ms` (histogram): upstream latency by service
//! - `gateway_route_lookups_total` (counter): route lookups by outcome
//! - `gateway_selections_total` (counter): selections by strategy, outcome
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_health_probe_duration_ms` (histogram): probe latency by service
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup
//! - Aggregates served to the dispatcher come from `collector.rs`, not from here

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

pub fn record_request(service: &str, success: bool, latency_ms: f64) {
    counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "outcome" => outcome(success)
    )
    .increment(1);
    histogram!("gateway_request_duration_ms", "service" => service.to_string()).record(latency_ms);
}

pub fn record_route_lookup(matched: bool) {
    let outcome = if matched { "matched" } else { "no_route" };
    counter!("gateway_route_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_selection(strategy: &'static str, selected: bool) {
    let outcome = if selected { "selected" } else { "no_healthy_service" };
    counter!("gateway_selections_total", "strategy" => strategy, "outcome" => outcome).increment(1);
}

pub fn record_service_health(service: &str, healthy: bool) {
    gauge!("gateway_service_health", "service" => service.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe_duration(service: &str, elapsed_ms: u64) {
    histogram!("gateway_health_probe_duration_ms", "service" => service.to_string()).record(elapsed_ms as f64);
}
