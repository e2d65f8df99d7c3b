//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference configured services)
//! - Validate value ranges (interval and timeout > 0, threshold in [0, 1])
//! - Accept only plain `http` upstreams; health probes do not speak TLS
//! - Reject duplicate ids and uncompilable conditions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, LoadBalancerConfig};
use crate::routing::matcher::ConditionMatcher;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("load_balancer.{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("load_balancer.circuit_breaker_error_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(String),

    #[error("health_check_path must start with '/', got {0:?}")]
    InvalidProbePath(String),

    #[error("service #{index} has an empty name")]
    EmptyServiceName { index: usize },

    #[error("duplicate service id {0:?}")]
    DuplicateServiceId(String),

    #[error("service {service:?} has invalid base_url {url:?} (expected http://host[:port])")]
    InvalidBaseUrl { service: String, url: String },

    #[error("duplicate route id {0:?}")]
    DuplicateRouteId(String),

    #[error("route {route:?} path must start with '/', got {path:?}")]
    InvalidRoutePath { route: String, path: String },

    #[error("route {route:?} has an empty method")]
    EmptyMethod { route: String },

    #[error("route {route:?} has no targets")]
    NoTargets { route: String },

    #[error("route {route:?} targets unknown service {service:?}")]
    UnknownTarget { route: String, service: String },

    #[error("route {route:?} has an invalid condition: {reason}")]
    InvalidCondition { route: String, reason: String },
}

/// Check the load balancer settings a running gateway depends on.
pub fn validate_load_balancer(lb: &LoadBalancerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if lb.health_check_interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration { field: "health_check_interval_ms" });
    }
    if lb.health_check_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration { field: "health_check_timeout_ms" });
    }
    if !(0.0..=1.0).contains(&lb.circuit_breaker_error_threshold) {
        errors.push(ValidationError::ThresholdOutOfRange(
            lb.circuit_breaker_error_threshold.to_string(),
        ));
    }
    if !lb.health_check_path.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath(lb.health_check_path.clone()));
    }

    errors
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_load_balancer(&config.load_balancer);

    let mut service_ids = HashSet::new();
    for (index, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName { index });
        }
        if !service.id.is_empty() && !service_ids.insert(service.id.as_str()) {
            errors.push(ValidationError::DuplicateServiceId(service.id.clone()));
        }
        let url_ok = Url::parse(&service.base_url)
            .map(|u| u.scheme() == "http" && u.has_host())
            .unwrap_or(false);
        if !url_ok {
            errors.push(ValidationError::InvalidBaseUrl {
                service: service.name.clone(),
                url: service.base_url.clone(),
            });
        }
    }

    let mut route_ids = HashSet::new();
    for route in &config.routes {
        let label = if route.id.is_empty() { route.path.clone() } else { route.id.clone() };

        if !route.id.is_empty() && !route_ids.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRouteId(route.id.clone()));
        }
        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidRoutePath {
                route: label.clone(),
                path: route.path.clone(),
            });
        }
        if route.method.trim().is_empty() {
            errors.push(ValidationError::EmptyMethod { route: label.clone() });
        }
        if route.targets.is_empty() {
            errors.push(ValidationError::NoTargets { route: label.clone() });
        }
        for target in &route.targets {
            if !service_ids.contains(target.as_str()) {
                errors.push(ValidationError::UnknownTarget {
                    route: label.clone(),
                    service: target.clone(),
                });
            }
        }
        for condition in &route.conditions {
            if let Err(e) = ConditionMatcher::compile(condition) {
                errors.push(ValidationError::InvalidCondition {
                    route: label.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, ServiceConfig};
    use crate::routing::rule::{ConditionOperator, ConditionType, RouteCondition};

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.services.push(ServiceConfig::new("a", "alpha", "http://127.0.0.1:9000"));
        config
            .routes
            .push(RouteConfig::new("r1", "/v1/items", "GET", vec!["a".into()]));
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.load_balancer.health_check_interval_ms = 0;
        config.services.push(ServiceConfig::new("a", "again", "not a url"));
        config
            .routes
            .push(RouteConfig::new("r1", "v1/other", "GET", vec!["ghost".into()]));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroDuration { field: "health_check_interval_ms" }));
        assert!(errors.contains(&ValidationError::DuplicateServiceId("a".into())));
        assert!(errors.contains(&ValidationError::DuplicateRouteId("r1".into())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBaseUrl { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidRoutePath { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownTarget { service, .. } if service == "ghost")));
    }

    #[test]
    fn test_rejects_https_base_url() {
        let mut config = valid_config();
        config.services[0].base_url = "https://127.0.0.1:9443".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::InvalidBaseUrl { url, .. } if url.starts_with("https")));
    }

    #[test]
    fn test_load_balancer_checks_stand_alone() {
        let lb = LoadBalancerConfig {
            health_check_interval_ms: 0,
            health_check_timeout_ms: 0,
            ..LoadBalancerConfig::default()
        };
        let errors = validate_load_balancer(&lb);
        assert_eq!(errors.len(), 2);
        assert!(validate_load_balancer(&LoadBalancerConfig::default()).is_empty());
    }

    #[test]
    fn test_rejects_bad_regex() {
        let mut config = valid_config();
        config.routes[0].conditions.push(RouteCondition::new(
            ConditionType::Header,
            "x-version",
            ConditionOperator::Regex,
            "([",
        ));
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidCondition { .. }));
    }
}
