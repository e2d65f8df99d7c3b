//! Gateway error definitions.
//!
//! Routing and selection failures are ordinary outcomes the dispatcher maps
//! to a response; nothing here is fatal to the process.

use thiserror::Error;

/// Errors surfaced by the gateway to its callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No active rule matched the request.
    #[error("No route matched {method} {path}")]
    NoRouteMatched { method: String, path: String },

    /// A rule matched but none of its targets is active and healthy.
    #[error("No healthy service available for route {route}")]
    NoHealthyService { route: String },

    /// A service id is already registered.
    #[error("Service {0} is already registered")]
    DuplicateService(String),

    /// A route id is already registered.
    #[error("Route {0} is already registered")]
    DuplicateRoute(String),

    /// A service base URL could not be parsed.
    #[error("Invalid base URL {url} for service {service}: {reason}")]
    InvalidBaseUrl {
        service: String,
        url: String,
        reason: String,
    },

    /// A route condition could not be compiled.
    #[error("Invalid condition on field {field}: {reason}")]
    InvalidCondition { field: String, reason: String },

    /// Any other rejected registration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// HTTP status class the dispatcher should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::NoRouteMatched { .. } => 404,
            GatewayError::NoHealthyService { .. } => 503,
            _ => 500,
        }
    }

    /// True for failures caused by registration input rather than traffic.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            GatewayError::NoRouteMatched { .. } | GatewayError::NoHealthyService { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let miss = GatewayError::NoRouteMatched {
            method: "GET".into(),
            path: "/nope".into(),
        };
        assert_eq!(miss.status_code(), 404);
        assert!(!miss.is_configuration());

        let down = GatewayError::NoHealthyService { route: "r1".into() };
        assert_eq!(down.status_code(), 503);

        let dup = GatewayError::DuplicateService("svc".into());
        assert_eq!(dup.status_code(), 500);
        assert!(dup.is_configuration());
        assert_eq!(dup.to_string(), "Service svc is already registered");
    }
}
