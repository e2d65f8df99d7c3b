//! Service endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream service instance
//! - Track active connections (for Least Connections LB)
//! - Enforce max connection limits for guarded dispatch
//! - Track health state, probe latency and decaying error rate

use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::GatewayError;

/// Amount the error rate drops after a successful probe.
pub const ERROR_RATE_RECOVERY: f64 = 0.05;
/// Amount the error rate rises after a failed probe.
pub const ERROR_RATE_PENALTY: f64 = 0.1;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// A single upstream service instance.
///
/// Identity and capacity are fixed at registration; live state sits in
/// atomics so probes and dispatch never contend on a lock.
#[derive(Debug)]
pub struct ServiceEndpoint {
    /// Unique, immutable identifier.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Base URL probes and proxied requests are built from.
    pub base_url: Url,
    /// Relative weight for the weighted strategy.
    pub weight: u32,
    /// Maximum concurrent connections allowed through guards.
    pub max_connections: usize,
    /// Registration sequence number.
    pub(crate) seq: u64,

    current_connections: AtomicUsize,
    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    response_time_ms: AtomicU64,
    /// `f64` bit pattern.
    error_rate: AtomicU64,
    /// Unix millis of the last probe, 0 when never probed.
    last_health_check_ms: AtomicU64,
    active: AtomicBool,
}

impl ServiceEndpoint {
    /// Create an endpoint from its configuration under the given id.
    pub fn new(id: String, config: &ServiceConfig, seq: u64) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| GatewayError::InvalidBaseUrl {
            service: id.clone(),
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        // Probes use a plain HTTP connector.
        if base_url.scheme() != "http" {
            return Err(GatewayError::InvalidBaseUrl {
                service: id,
                url: config.base_url.clone(),
                reason: format!("unsupported scheme {}, only http is probed", base_url.scheme()),
            });
        }
        if !base_url.has_host() {
            return Err(GatewayError::InvalidBaseUrl {
                service: id,
                url: config.base_url.clone(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            id,
            name: config.name.clone(),
            base_url,
            weight: config.weight,
            max_connections: config.max_connections,
            seq,
            current_connections: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            response_time_ms: AtomicU64::new(0),
            error_rate: AtomicU64::new(0f64.to_bits()),
            last_health_check_ms: AtomicU64::new(0),
            active: AtomicBool::new(true),
        })
    }

    /// URL of the health probe for this endpoint.
    pub fn probe_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    pub fn current_connections(&self) -> usize {
        self.current_connections.load(Ordering::Relaxed)
    }

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    pub fn response_time_ms(&self) -> u64 {
        self.response_time_ms.load(Ordering::Relaxed)
    }

    pub fn error_rate(&self) -> f64 {
        f64::from_bits(self.error_rate.load(Ordering::Relaxed))
    }

    pub fn last_health_check_at(&self) -> Option<SystemTime> {
        match self.last_health_check_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(UNIX_EPOCH + Duration::from_millis(ms)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Eligible for selection: active and last probe succeeded.
    pub fn is_available(&self) -> bool {
        self.is_active() && self.health() == HealthState::Healthy
    }

    /// Apply a signed delta to the connection count, saturating at zero.
    pub fn add_connections(&self, delta: i64) {
        let _ = self
            .current_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                let next = if delta >= 0 {
                    current.saturating_add(delta as usize)
                } else {
                    current.saturating_sub(delta.unsigned_abs() as usize)
                };
                Some(next)
            });
    }

    /// Try to create a connection guard that increments count.
    pub fn try_create_guard(self: &Arc<Self>) -> Option<ConnectionGuard> {
        let mut prev = self.current_connections.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_connections {
                return None;
            }
            match self.current_connections.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(ConnectionGuard {
            endpoint: self.clone(),
        })
    }

    // --- Health Logic ---

    /// Record a probe outcome. Returns the previous health state.
    pub fn record_probe(&self, health: HealthState, response_time_ms: u64, success: bool) -> HealthState {
        let _ = self
            .error_rate
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let rate = f64::from_bits(bits);
                let next = if success {
                    (rate - ERROR_RATE_RECOVERY).max(0.0)
                } else {
                    (rate + ERROR_RATE_PENALTY).min(1.0)
                };
                Some(next.to_bits())
            });
        self.response_time_ms.store(response_time_ms, Ordering::Relaxed);
        self.last_health_check_ms.store(now_millis(), Ordering::Relaxed);
        HealthState::from(self.state.swap(health as u8, Ordering::Relaxed))
    }

    /// Point-in-time copy of the endpoint for reporting.
    pub fn snapshot(&self) -> EndpointSnapshot {
        EndpointSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            base_url: self.base_url.to_string(),
            weight: self.weight,
            max_connections: self.max_connections,
            current_connections: self.current_connections(),
            health: self.health(),
            response_time_ms: self.response_time_ms(),
            error_rate: self.error_rate(),
            last_health_check_at: self.last_health_check_at(),
            active: self.is_active(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
        .max(1)
}

/// Serializable view of an endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub weight: u32,
    pub max_connections: usize,
    pub current_connections: usize,
    pub health: HealthState,
    pub response_time_ms: u64,
    pub error_rate: f64,
    pub last_health_check_at: Option<SystemTime>,
    pub active: bool,
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
pub struct ConnectionGuard {
    pub endpoint: Arc<ServiceEndpoint>,
}

impl Deref for ConnectionGuard {
    type Target = ServiceEndpoint;
    fn deref(&self) -> &Self::Target {
        &self.endpoint
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.endpoint.add_connections(-1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(max: usize) -> Arc<ServiceEndpoint> {
        let config = ServiceConfig::new("a", "alpha", "http://127.0.0.1:9000/").with_max_connections(max);
        Arc::new(ServiceEndpoint::new("a".into(), &config, 0).unwrap())
    }

    #[test]
    fn test_new_endpoint_defaults() {
        let ep = endpoint(10);
        assert_eq!(ep.health(), HealthState::Unknown);
        assert_eq!(ep.error_rate(), 0.0);
        assert!(ep.is_active());
        assert!(!ep.is_available());
        assert!(ep.last_health_check_at().is_none());
        assert_eq!(ep.probe_url("/health"), "http://127.0.0.1:9000/health");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        for url in ["ftp://example.com", "https://127.0.0.1:9443", "http:"] {
            let config = ServiceConfig::new("a", "alpha", url);
            let err = ServiceEndpoint::new("a".into(), &config, 0).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidBaseUrl { .. }), "{} accepted", url);
        }
    }

    #[test]
    fn test_connection_delta_never_negative() {
        let ep = endpoint(10);
        ep.add_connections(2);
        assert_eq!(ep.current_connections(), 2);
        ep.add_connections(-5);
        assert_eq!(ep.current_connections(), 0);
    }

    #[test]
    fn test_guard_enforces_max_connections() {
        let ep = endpoint(1);
        let guard = ep.try_create_guard().unwrap();
        assert_eq!(ep.current_connections(), 1);
        assert!(ep.try_create_guard().is_none());
        drop(guard);
        assert_eq!(ep.current_connections(), 0);
        assert!(ep.try_create_guard().is_some());
    }

    #[test]
    fn test_error_rate_smoothing() {
        let ep = endpoint(10);
        ep.record_probe(HealthState::Unhealthy, 5, false);
        assert_eq!(ep.error_rate(), 0.1);
        assert_eq!(ep.health(), HealthState::Unhealthy);

        let previous = ep.record_probe(HealthState::Healthy, 3, true);
        assert_eq!(previous, HealthState::Unhealthy);
        assert_eq!(ep.error_rate(), 0.05);
        assert_eq!(ep.response_time_ms(), 3);
        assert!(ep.last_health_check_at().is_some());
    }

    #[test]
    fn test_error_rate_clamped() {
        let ep = endpoint(10);
        for _ in 0..20 {
            ep.record_probe(HealthState::Unhealthy, 0, false);
        }
        assert_eq!(ep.error_rate(), 1.0);

        for _ in 0..40 {
            ep.record_probe(HealthState::Healthy, 0, true);
        }
        assert_eq!(ep.error_rate(), 0.0);
    }
}
