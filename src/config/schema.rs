//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::routing::rule::RouteCondition;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Selection strategy and health probing.
    pub load_balancer: LoadBalancerConfig,

    /// Upstream service definitions registered at startup.
    pub services: Vec<ServiceConfig>,

    /// Route definitions registered at startup.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Endpoint selection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerStrategy {
    #[default]
    RoundRobin,
    LeastConnections,
    Weighted,
    IpHash,
    ResponseTime,
}

impl LoadBalancerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancerStrategy::RoundRobin => "round_robin",
            LoadBalancerStrategy::LeastConnections => "least_connections",
            LoadBalancerStrategy::Weighted => "weighted",
            LoadBalancerStrategy::IpHash => "ip_hash",
            LoadBalancerStrategy::ResponseTime => "response_time",
        }
    }
}

impl fmt::Display for LoadBalancerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide load balancer configuration, fixed at gateway construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    /// Selection strategy.
    pub strategy: LoadBalancerStrategy,

    /// Interval between health probes in milliseconds.
    pub health_check_interval_ms: u64,

    /// Upper bound on a single probe in milliseconds.
    pub health_check_timeout_ms: u64,

    /// Path appended to each service base URL for probing.
    pub health_check_path: String,

    /// Accepted but not consulted by selection or probing.
    pub max_retries: u32,

    /// Accepted but not consulted by selection or probing.
    pub circuit_breaker_error_threshold: f64,
}

impl LoadBalancerConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            strategy: LoadBalancerStrategy::RoundRobin,
            health_check_interval_ms: 30_000,
            health_check_timeout_ms: 5_000,
            health_check_path: "/health".to_string(),
            max_retries: 3,
            circuit_breaker_error_threshold: 0.5,
        }
    }
}

/// Upstream service definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service identifier. Generated when left empty.
    #[serde(default)]
    pub id: String,

    /// Human readable name.
    pub name: String,

    /// Base URL, e.g. "http://10.0.0.5:8000".
    pub base_url: String,

    /// Weight for weighted load balancing (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Maximum concurrent connections to this service.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl ServiceConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            weight: default_weight(),
            max_connections: default_max_connections(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}

fn default_weight() -> u32 {
    1
}

fn default_max_connections() -> usize {
    100
}

/// Route definition mapping requests to candidate services.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Unique route identifier. Generated when left empty.
    #[serde(default)]
    pub id: String,

    /// Route name for logging.
    #[serde(default)]
    pub name: String,

    /// Path pattern; `:name` segments match any single segment.
    pub path: String,

    /// HTTP method, compared case-insensitively.
    pub method: String,

    /// Candidate service ids.
    pub targets: Vec<String>,

    /// Higher wins; ties go to the earlier registration.
    #[serde(default)]
    pub priority: i32,

    /// AND-combined request conditions.
    #[serde(default)]
    pub conditions: Vec<RouteCondition>,

    /// Inactive routes never match.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl RouteConfig {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            path: path.into(),
            method: method.into(),
            targets,
            priority: 0,
            conditions: Vec::new(),
            active: true,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_condition(mut self, condition: RouteCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

fn default_active() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
