//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::Strategy;
use crate::registry::ServiceEndpoint;

/// Round-robin selector.
/// Stores a single cursor shared by every route of the gateway.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], _client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        if candidates.is_empty() {
            return None;
        }

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
        Some(candidates[index].clone())
    }
}
