//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → target service ids identified
//!     → balancer.rs (resolve ids against the registry, keep active + healthy)
//!     → Apply configured strategy:
//!         - round_robin.rs (rotate through candidates)
//!         - least_conn.rs (fewest in-flight connections)
//!         - weighted.rs (random draw proportional to weight)
//!         - ip_hash.rs (client IPv4 octet sum modulo candidates)
//!         - response_time.rs (lowest last probe latency)
//!     → Return endpoint or None (no healthy service)
//! ```
//!
//! # Design Decisions
//! - Strategies never see unhealthy or inactive endpoints
//! - One strategy per gateway, chosen at construction
//! - Strategy state (round-robin cursor) is shared across routes

pub mod balancer;
pub mod ip_hash;
pub mod least_conn;
pub mod response_time;
pub mod round_robin;
pub mod weighted;

use std::sync::Arc;

use crate::config::LoadBalancerStrategy;
use crate::registry::ServiceEndpoint;

pub use balancer::LoadBalancer;

/// A selection algorithm over pre-filtered candidates.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Pick one candidate. `candidates` only holds available endpoints.
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>>;
}

/// Build the strategy implementation for a configured kind.
pub fn strategy_for(kind: LoadBalancerStrategy) -> Box<dyn Strategy> {
    match kind {
        LoadBalancerStrategy::RoundRobin => Box::new(round_robin::RoundRobin::new()),
        LoadBalancerStrategy::LeastConnections => Box::new(least_conn::LeastConnections::new()),
        LoadBalancerStrategy::Weighted => Box::new(weighted::Weighted::new()),
        LoadBalancerStrategy::IpHash => Box::new(ip_hash::IpHash::new()),
        LoadBalancerStrategy::ResponseTime => Box::new(response_time::ResponseTime::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::ServiceConfig;

    pub fn endpoint(id: &str) -> Arc<ServiceEndpoint> {
        endpoint_with_weight(id, 1)
    }

    pub fn endpoint_with_weight(id: &str, weight: u32) -> Arc<ServiceEndpoint> {
        let config = ServiceConfig::new(id, id, "http://127.0.0.1:9000").with_weight(weight);
        Arc::new(ServiceEndpoint::new(id.to_string(), &config, 0).unwrap())
    }
}
