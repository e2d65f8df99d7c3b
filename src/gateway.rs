//! Gateway facade.
//!
//! # Responsibilities
//! - Compose registry, route table, load balancer, collector and health monitor
//! - Expose the dispatcher-facing API (route lookup, selection, outcome recording, stats)
//! - Expose the bootstrap-facing API (service and route registration)
//! - Own the health monitor task and cancel it on `stop()` or drop
//!
//! # Design Decisions
//! - An explicit value passed to the dispatcher; no global instance
//! - Routing misses and unhealthy targets are `None`/error values, never panics

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::validation::validate_load_balancer;
use crate::config::{GatewayConfig, LoadBalancerConfig, RouteConfig, ServiceConfig};
use crate::error::GatewayError;
use crate::health::HealthMonitor;
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::observability::{EndpointStats, GatewayStats, MetricsCollector};
use crate::registry::{ConnectionGuard, EndpointSnapshot, ServiceEndpoint, ServiceRegistry};
use crate::routing::{RequestInfo, RouteRule, RouteTable};

/// A matched route together with the endpoint chosen for it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub route: Arc<RouteRule>,
    pub endpoint: Arc<ServiceEndpoint>,
}

pub struct Gateway {
    config: LoadBalancerConfig,
    registry: Arc<ServiceRegistry>,
    routes: RouteTable,
    balancer: LoadBalancer,
    collector: MetricsCollector,
    shutdown: broadcast::Sender<()>,
    wake: mpsc::UnboundedSender<String>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Gateway {
    /// Create a gateway and start its health monitor.
    ///
    /// Rejects a zero probe interval or timeout. Must be called from within
    /// a Tokio runtime.
    pub fn new(config: LoadBalancerConfig) -> Result<Self, GatewayError> {
        let problems = validate_load_balancer(&config);
        if !problems.is_empty() {
            let reason = problems.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            return Err(GatewayError::Configuration(reason));
        }

        let registry = Arc::new(ServiceRegistry::new());
        let balancer = LoadBalancer::new(registry.clone(), config.strategy);
        let (shutdown, rx) = broadcast::channel(1);
        let (wake, wake_rx) = mpsc::unbounded_channel();

        let monitor = HealthMonitor::new(registry.clone(), &config);
        let handle = tokio::spawn(monitor.run(rx, wake_rx));

        tracing::info!(
            strategy = %config.strategy,
            health_check_interval_ms = config.health_check_interval_ms,
            health_check_timeout_ms = config.health_check_timeout_ms,
            max_retries = config.max_retries,
            circuit_breaker_error_threshold = config.circuit_breaker_error_threshold,
            "Gateway started"
        );

        Ok(Self {
            config,
            registry,
            routes: RouteTable::new(),
            balancer,
            collector: MetricsCollector::new(),
            shutdown,
            wake,
            monitor: Mutex::new(Some(handle)),
        })
    }

    /// Create a gateway and register the configured services and routes.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let gateway = Self::new(config.load_balancer.clone())?;
        for service in &config.services {
            gateway.add_service(service)?;
        }
        for route in &config.routes {
            gateway.add_route(route)?;
        }
        Ok(gateway)
    }

    pub fn config(&self) -> &LoadBalancerConfig {
        &self.config
    }

    // --- Bootstrap API ---

    /// Register a service and have the monitor check it right away.
    pub fn add_service(&self, config: &ServiceConfig) -> Result<String, GatewayError> {
        let id = self.registry.add(config)?;
        // Fails only once the monitor is stopped.
        let _ = self.wake.send(id.clone());
        Ok(id)
    }

    pub fn remove_service(&self, id: &str) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            self.collector.forget(id);
        }
        removed
    }

    pub fn set_service_active(&self, id: &str, active: bool) -> bool {
        self.registry.set_active(id, active)
    }

    pub fn add_route(&self, config: &RouteConfig) -> Result<String, GatewayError> {
        self.routes.add(config)
    }

    pub fn update_route(&self, config: &RouteConfig) -> Result<bool, GatewayError> {
        self.routes.update(config)
    }

    pub fn set_route_active(&self, id: &str, active: bool) -> bool {
        self.routes.set_active(id, active)
    }

    pub fn remove_route(&self, id: &str) -> bool {
        self.routes.remove(id)
    }

    // --- Dispatcher API ---

    /// Highest-priority active rule matching the request, if any.
    pub fn find_route(
        &self,
        path: &str,
        method: &str,
        headers: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> Option<Arc<RouteRule>> {
        let found = self.routes.find(&RequestInfo::new(path, method, headers, query));
        metrics::record_route_lookup(found.is_some());
        found
    }

    /// One active, healthy endpoint among the candidates, if any.
    pub fn select_service(&self, candidate_ids: &[String], client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        self.balancer.select(candidate_ids, client_ip)
    }

    /// Route lookup and endpoint selection in one step.
    pub fn resolve(&self, request: &RequestInfo<'_>, client_ip: Option<&str>) -> Result<Resolution, GatewayError> {
        let route = self
            .find_route(request.path, request.method, request.headers, request.query)
            .ok_or_else(|| GatewayError::NoRouteMatched {
                method: request.method.to_string(),
                path: request.path.to_string(),
            })?;

        let endpoint = self
            .select_service(&route.target_service_ids, client_ip)
            .ok_or_else(|| {
                tracing::warn!(route_id = %route.id, "No healthy service for matched route");
                GatewayError::NoHealthyService {
                    route: route.id.clone(),
                }
            })?;

        Ok(Resolution { route, endpoint })
    }

    /// Record the outcome of a proxied request.
    ///
    /// Ids no longer registered count towards the totals only.
    pub fn record_request(&self, endpoint_id: &str, latency_ms: f64, success: bool) {
        if self.registry.get(endpoint_id).is_some() {
            self.collector.record_request(endpoint_id, latency_ms, success);
        } else {
            self.collector.record_unattributed(endpoint_id, latency_ms, success);
        }
    }

    pub fn get_stats(&self) -> GatewayStats {
        self.collector.stats(
            self.registry.total_connections(),
            self.registry.len(),
            self.routes.len(),
        )
    }

    pub fn endpoint_stats(&self, endpoint_id: &str) -> Option<EndpointStats> {
        self.collector.endpoint_stats(endpoint_id)
    }

    /// Adjust an endpoint's in-flight connection count.
    pub fn mark_connection_delta(&self, id: &str, delta: i64) -> bool {
        self.registry.mark_connection_delta(id, delta)
    }

    /// Reserve a connection slot that is released on drop.
    pub fn acquire(&self, id: &str) -> Option<ConnectionGuard> {
        self.registry.try_acquire(id)
    }

    // --- Introspection ---

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn services(&self) -> Vec<EndpointSnapshot> {
        self.registry.list().iter().map(|e| e.snapshot()).collect()
    }

    pub fn routes(&self) -> Vec<Arc<RouteRule>> {
        self.routes.list()
    }

    // --- Lifecycle ---

    /// True while the health monitor task is alive.
    pub fn is_running(&self) -> bool {
        let guard = match self.monitor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the health monitor and any probes in flight. Idempotent.
    pub fn stop(&self) {
        let handle = match self.monitor.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = self.shutdown.send(());
            handle.abort();
            tracing::info!("Gateway stopped");
        }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("strategy", &self.config.strategy)
            .field("services", &self.registry.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}
