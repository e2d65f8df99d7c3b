//! Route table.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the best matching route for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Highest priority wins; ties go to the earliest registration
//! - O(n) scan over active routes (acceptable for typical route counts)
//! - Rules are immutable once compiled; updates swap in a new compiled entry

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use uuid::Uuid;

use crate::config::RouteConfig;
use crate::error::GatewayError;
use crate::routing::matcher::{AndMatcher, Matcher, RequestInfo};
use crate::routing::rule::RouteRule;

#[derive(Debug)]
struct CompiledRoute {
    rule: Arc<RouteRule>,
    matcher: AndMatcher,
}

impl CompiledRoute {
    fn compile(rule: RouteRule) -> Result<Self, GatewayError> {
        let matcher = AndMatcher::for_rule(&rule)?;
        Ok(Self {
            rule: Arc::new(rule),
            matcher,
        })
    }
}

/// Ordered collection of routing rules.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RwLock<Vec<CompiledRoute>>,
    lookups: AtomicU64,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. An empty id is replaced by a generated one.
    pub fn add(&self, config: &RouteConfig) -> Result<String, GatewayError> {
        check_shape(config)?;
        let id = if config.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            config.id.clone()
        };

        let compiled = CompiledRoute::compile(RouteRule::from_config(id.clone(), config, SystemTime::now()))?;

        let mut routes = self.routes.write().expect("route table lock poisoned");
        if routes.iter().any(|r| r.rule.id == id) {
            return Err(GatewayError::DuplicateRoute(id));
        }
        tracing::info!(
            route_id = %id,
            method = %compiled.rule.http_method,
            path = %compiled.rule.path_pattern,
            priority = compiled.rule.priority,
            targets = ?compiled.rule.target_service_ids,
            "Route added"
        );
        routes.push(compiled);
        Ok(id)
    }

    /// Replace an existing rule in place, keeping its position and creation time.
    /// Returns false when no rule has the config's id.
    pub fn update(&self, config: &RouteConfig) -> Result<bool, GatewayError> {
        check_shape(config)?;
        let mut routes = self.routes.write().expect("route table lock poisoned");
        let Some(slot) = routes.iter_mut().find(|r| r.rule.id == config.id) else {
            return Ok(false);
        };

        let mut rule = RouteRule::from_config(config.id.clone(), config, slot.rule.created_at);
        rule.updated_at = SystemTime::now();
        *slot = CompiledRoute::compile(rule)?;
        tracing::info!(route_id = %config.id, "Route updated");
        Ok(true)
    }

    /// Enable or disable a rule without removing it.
    pub fn set_active(&self, id: &str, active: bool) -> bool {
        let mut routes = self.routes.write().expect("route table lock poisoned");
        let Some(slot) = routes.iter_mut().find(|r| r.rule.id == id) else {
            return false;
        };

        let mut rule = (*slot.rule).clone();
        rule.active = active;
        rule.updated_at = SystemTime::now();
        slot.rule = Arc::new(rule);
        tracing::info!(route_id = %id, active, "Route activity changed");
        true
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut routes = self.routes.write().expect("route table lock poisoned");
        let before = routes.len();
        routes.retain(|r| r.rule.id != id);
        let removed = routes.len() != before;
        if removed {
            tracing::info!(route_id = %id, "Route removed");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<RouteRule>> {
        let routes = self.routes.read().expect("route table lock poisoned");
        routes.iter().find(|r| r.rule.id == id).map(|r| r.rule.clone())
    }

    /// All rules in registration order.
    pub fn list(&self) -> Vec<Arc<RouteRule>> {
        let routes = self.routes.read().expect("route table lock poisoned");
        routes.iter().map(|r| r.rule.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.read().expect("route table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups served since creation.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Find the highest-priority active rule matching the request.
    pub fn find(&self, req: &RequestInfo<'_>) -> Option<Arc<RouteRule>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let routes = self.routes.read().expect("route table lock poisoned");

        let mut best: Option<&CompiledRoute> = None;
        for route in routes.iter().filter(|r| r.rule.active) {
            if !route.matcher.matches(req) {
                continue;
            }
            // Strictly greater keeps the earliest registration on ties.
            if best.map_or(true, |b| route.rule.priority > b.rule.priority) {
                best = Some(route);
            }
        }

        match best {
            Some(route) => {
                tracing::debug!(
                    route_id = %route.rule.id,
                    method = %req.method,
                    path = %req.path,
                    "Route matched"
                );
                Some(route.rule.clone())
            }
            None => {
                tracing::debug!(method = %req.method, path = %req.path, "No route matched");
                None
            }
        }
    }
}

fn check_shape(config: &RouteConfig) -> Result<(), GatewayError> {
    if !config.path.starts_with('/') {
        return Err(GatewayError::Configuration(format!(
            "route path must start with '/', got {:?}",
            config.path
        )));
    }
    if config.method.trim().is_empty() {
        return Err(GatewayError::Configuration("route method must not be empty".into()));
    }
    if config.targets.is_empty() {
        return Err(GatewayError::Configuration(format!(
            "route {:?} has no target services",
            config.id
        )));
    }
    Ok(())
}
