//! Service registry.
//!
//! # Responsibilities
//! - Own the set of upstream endpoints keyed by id
//! - Apply targeted connection and health updates
//! - Hand out shared references for selection and probing

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::registry::endpoint::{ConnectionGuard, HealthState, ServiceEndpoint};

/// Concurrent map of registered endpoints.
///
/// The map itself is sharded; each endpoint's mutable state lives in its own
/// atomics, so updates to different endpoints never serialize on each other.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    endpoints: DashMap<String, Arc<ServiceEndpoint>>,
    next_seq: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. An empty id is replaced by a generated one.
    pub fn add(&self, config: &ServiceConfig) -> Result<String, GatewayError> {
        let id = if config.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            config.id.clone()
        };

        match self.endpoints.entry(id.clone()) {
            Entry::Occupied(_) => Err(GatewayError::DuplicateService(id)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                let endpoint = ServiceEndpoint::new(id.clone(), config, seq)?;
                tracing::info!(
                    service_id = %id,
                    name = %endpoint.name,
                    base_url = %endpoint.base_url,
                    weight = endpoint.weight,
                    "Service registered"
                );
                slot.insert(Arc::new(endpoint));
                Ok(id)
            }
        }
    }

    /// Remove an endpoint. Holders of a reference see it as inactive.
    pub fn remove(&self, id: &str) -> bool {
        match self.endpoints.remove(id) {
            Some((_, endpoint)) => {
                endpoint.set_active(false);
                tracing::info!(service_id = %id, "Service removed");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ServiceEndpoint>> {
        self.endpoints.get(id).map(|e| e.value().clone())
    }

    /// All endpoints in registration order.
    pub fn list(&self) -> Vec<Arc<ServiceEndpoint>> {
        let mut all: Vec<_> = self.endpoints.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|e| e.seq);
        all
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Soft enable or disable an endpoint without removing it.
    pub fn set_active(&self, id: &str, active: bool) -> bool {
        match self.endpoints.get(id) {
            Some(endpoint) => {
                endpoint.set_active(active);
                tracing::info!(service_id = %id, active, "Service activity changed");
                true
            }
            None => false,
        }
    }

    /// Apply a connection count delta. Returns false for unknown ids.
    pub fn mark_connection_delta(&self, id: &str, delta: i64) -> bool {
        match self.endpoints.get(id) {
            Some(endpoint) => {
                endpoint.add_connections(delta);
                true
            }
            None => false,
        }
    }

    /// Reserve a connection slot on an endpoint, honouring `max_connections`.
    pub fn try_acquire(&self, id: &str) -> Option<ConnectionGuard> {
        self.get(id)?.try_create_guard()
    }

    /// Record a health probe outcome. Returns false for unknown ids.
    pub fn update_health(&self, id: &str, health: HealthState, response_time_ms: u64, success: bool) -> bool {
        let Some(endpoint) = self.get(id) else {
            return false;
        };

        let previous = endpoint.record_probe(health, response_time_ms, success);
        if previous != health {
            match health {
                HealthState::Healthy => tracing::info!(
                    service_id = %id,
                    from = ?previous,
                    response_time_ms,
                    "Service became healthy"
                ),
                _ => tracing::warn!(
                    service_id = %id,
                    from = ?previous,
                    to = ?health,
                    error_rate = endpoint.error_rate(),
                    "Service health changed"
                ),
            }
        }
        true
    }

    /// Sum of in-flight connections across all endpoints.
    pub fn total_connections(&self) -> usize {
        self.endpoints.iter().map(|e| e.current_connections()).sum()
    }
}
