//! Fastest-responder load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::Strategy;
use crate::registry::ServiceEndpoint;

/// Picks the endpoint with the lowest last probe latency; first wins ties.
#[derive(Debug, Default)]
pub struct ResponseTime;

impl ResponseTime {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for ResponseTime {
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], _client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        candidates.iter().min_by_key(|e| e.response_time_ms()).cloned()
    }
}
