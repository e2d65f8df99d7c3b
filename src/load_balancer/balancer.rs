//! Candidate resolution and strategy dispatch.
//!
//! # Responsibilities
//! - Resolve candidate ids against the registry
//! - Exclude inactive, unhealthy and unknown endpoints
//! - Apply the configured strategy to the survivors
//!
//! Survivors are ordered by registration before the strategy sees them, so
//! round-robin rotation, least-connections ties and the ip-hash index follow
//! registration order rather than the order a route lists its targets.

use std::sync::Arc;

use crate::config::LoadBalancerStrategy;
use crate::load_balancer::{strategy_for, Strategy};
use crate::observability::metrics;
use crate::registry::{ServiceEndpoint, ServiceRegistry};

/// Selects one healthy endpoint out of a route's candidates.
#[derive(Debug)]
pub struct LoadBalancer {
    registry: Arc<ServiceRegistry>,
    kind: LoadBalancerStrategy,
    strategy: Box<dyn Strategy>,
}

impl LoadBalancer {
    pub fn new(registry: Arc<ServiceRegistry>, kind: LoadBalancerStrategy) -> Self {
        Self {
            registry,
            kind,
            strategy: strategy_for(kind),
        }
    }

    pub fn strategy(&self) -> LoadBalancerStrategy {
        self.kind
    }

    /// Pick an endpoint among `candidate_ids`, or None when none is available.
    pub fn select(&self, candidate_ids: &[String], client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        let mut available: Vec<Arc<ServiceEndpoint>> = candidate_ids
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|e| e.is_available())
            .collect();
        available.sort_by_key(|e| e.seq);

        if available.is_empty() {
            tracing::debug!(
                candidates = ?candidate_ids,
                strategy = %self.kind,
                "No healthy candidates"
            );
            for id in candidate_ids {
                match self.registry.get(id) {
                    Some(e) => tracing::debug!(service_id = %id, health = ?e.health(), active = e.is_active(), "Candidate status"),
                    None => tracing::debug!(service_id = %id, "Candidate not registered"),
                }
            }
            metrics::record_selection(self.kind.as_str(), false);
            return None;
        }

        let picked = self.strategy.next_server(&available, client_ip);
        metrics::record_selection(self.kind.as_str(), picked.is_some());
        picked
    }
}
