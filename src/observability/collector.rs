//! In-process request outcome aggregation.
//!
//! Keeps lifetime totals plus a bounded window of recent latencies per
//! endpoint; `GatewayStats` is recomputed from these on every call.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::metrics;

/// Number of latency samples retained per endpoint.
pub const DEFAULT_LATENCY_WINDOW: usize = 100;

/// Aggregate gateway statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayStats {
    pub total_requests: u64,
    /// Sum of in-flight connections over all endpoints.
    pub active_connections: usize,
    /// Mean over the retained latency samples of all endpoints.
    pub average_response_time_ms: f64,
    /// Total errors over total requests.
    pub error_rate: f64,
    pub service_count: usize,
    pub route_count: usize,
}

/// Per-endpoint view of recorded traffic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStats {
    pub requests: u64,
    pub errors: u64,
    pub average_response_time_ms: f64,
    pub samples: usize,
}

#[derive(Debug, Default)]
struct EndpointCounters {
    requests: u64,
    errors: u64,
    latencies: VecDeque<f64>,
}

impl EndpointCounters {
    fn latency_sum(&self) -> f64 {
        self.latencies.iter().sum()
    }
}

#[derive(Debug)]
pub struct MetricsCollector {
    window: usize,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    endpoints: DashMap<String, EndpointCounters>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::with_window(DEFAULT_LATENCY_WINDOW)
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            endpoints: DashMap::new(),
        }
    }

    /// Record the outcome of one proxied request.
    pub fn record_request(&self, endpoint_id: &str, latency_ms: f64, success: bool) {
        let latency_ms = if latency_ms.is_finite() { latency_ms.max(0.0) } else { 0.0 };

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }

        {
            let mut counters = self.endpoints.entry(endpoint_id.to_string()).or_default();
            counters.requests += 1;
            if !success {
                counters.errors += 1;
            }
            if counters.latencies.len() == self.window {
                counters.latencies.pop_front();
            }
            counters.latencies.push_back(latency_ms);
        }

        metrics::record_request(endpoint_id, success, latency_ms);
    }

    /// Count a request against the totals without keeping a latency window,
    /// for ids that are not (or no longer) registered.
    pub fn record_unattributed(&self, endpoint_id: &str, latency_ms: f64, success: bool) {
        let latency_ms = if latency_ms.is_finite() { latency_ms.max(0.0) } else { 0.0 };

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(service_id = %endpoint_id, "Request outcome for unregistered service");
        metrics::record_request(endpoint_id, success, latency_ms);
    }

    /// Drop an endpoint's latency window. Lifetime totals are kept.
    pub fn forget(&self, endpoint_id: &str) {
        self.endpoints.remove(endpoint_id);
    }

    pub fn endpoint_stats(&self, endpoint_id: &str) -> Option<EndpointStats> {
        self.endpoints.get(endpoint_id).map(|c| EndpointStats {
            requests: c.requests,
            errors: c.errors,
            average_response_time_ms: mean(c.latency_sum(), c.latencies.len()),
            samples: c.latencies.len(),
        })
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    /// Aggregate stats; counts owned by other components are passed in.
    pub fn stats(&self, active_connections: usize, service_count: usize, route_count: usize) -> GatewayStats {
        let (sum, samples) = self
            .endpoints
            .iter()
            .fold((0.0, 0usize), |(sum, n), c| (sum + c.latency_sum(), n + c.latencies.len()));

        let total_requests = self.total_requests();
        let error_rate = if total_requests == 0 {
            0.0
        } else {
            self.total_errors() as f64 / total_requests as f64
        };

        GatewayStats {
            total_requests,
            active_connections,
            average_response_time_ms: mean(sum, samples),
            error_rate,
            service_count,
            route_count,
        }
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let collector = MetricsCollector::new();
        let stats = collector.stats(0, 0, 0);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.average_response_time_ms, 0.0);
    }

    #[test]
    fn test_totals_and_error_rate() {
        let collector = MetricsCollector::new();
        collector.record_request("a", 10.0, true);
        collector.record_request("a", 30.0, false);
        collector.record_request("b", 20.0, true);
        collector.record_request("b", 40.0, false);

        let stats = collector.stats(3, 2, 1);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.error_rate, 0.5);
        assert_eq!(stats.average_response_time_ms, 25.0);
        assert_eq!(stats.active_connections, 3);
        assert_eq!(stats.service_count, 2);
        assert_eq!(stats.route_count, 1);

        let a = collector.endpoint_stats("a").unwrap();
        assert_eq!(a.requests, 2);
        assert_eq!(a.errors, 1);
        assert_eq!(a.average_response_time_ms, 20.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let collector = MetricsCollector::new();
        for _ in 0..DEFAULT_LATENCY_WINDOW {
            collector.record_request("a", 1000.0, true);
        }
        for _ in 0..DEFAULT_LATENCY_WINDOW {
            collector.record_request("a", 10.0, true);
        }

        let a = collector.endpoint_stats("a").unwrap();
        assert_eq!(a.samples, DEFAULT_LATENCY_WINDOW);
        assert_eq!(a.requests, 2 * DEFAULT_LATENCY_WINDOW as u64);
        assert_eq!(a.average_response_time_ms, 10.0);
    }

    #[test]
    fn test_forget_keeps_totals() {
        let collector = MetricsCollector::with_window(5);
        collector.record_request("a", 10.0, false);
        collector.forget("a");
        assert!(collector.endpoint_stats("a").is_none());

        let stats = collector.stats(0, 0, 0);
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.error_rate, 1.0);
        assert_eq!(stats.average_response_time_ms, 0.0);
    }

    #[test]
    fn test_unattributed_skips_window() {
        let collector = MetricsCollector::new();
        collector.record_request("a", 20.0, true);
        collector.record_unattributed("gone", 900.0, false);

        assert!(collector.endpoint_stats("gone").is_none());
        let stats = collector.stats(0, 1, 0);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.error_rate, 0.5);
        assert_eq!(stats.average_response_time_ms, 20.0);
    }

    #[test]
    fn test_non_finite_latency_clamped() {
        let collector = MetricsCollector::new();
        collector.record_request("a", f64::NAN, true);
        collector.record_request("a", -5.0, true);
        assert_eq!(collector.endpoint_stats("a").unwrap().average_response_time_ms, 0.0);
    }
}
