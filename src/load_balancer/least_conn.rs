//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::Strategy;
use crate::registry::ServiceEndpoint;

/// Least connections selector.
/// Selects the endpoint with the minimum number of in-flight connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for LeastConnections {
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], _client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        // In case of tie, the first one is selected (stability)
        candidates.iter().min_by_key(|e| e.current_connections()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::endpoint;

    #[test]
    fn test_least_conn() {
        let lb = LeastConnections::new();
        let b1 = endpoint("b1");
        let b2 = endpoint("b2");

        // artificially increase connections on b1
        b1.add_connections(1);

        let candidates = vec![b1.clone(), b2.clone()];

        // Should pick b2 (0 connections)
        let s1 = lb.next_server(&candidates, None).unwrap();
        assert_eq!(s1.id, b2.id);

        // now b2 has 2, b1 has 1
        b2.add_connections(2);

        let s2 = lb.next_server(&candidates, None).unwrap();
        assert_eq!(s2.id, b1.id);
    }

    #[test]
    fn test_tie_picks_first() {
        let lb = LeastConnections::new();
        let candidates = vec![endpoint("x"), endpoint("y"), endpoint("z")];
        candidates[0].add_connections(3);
        assert_eq!(lb.next_server(&candidates, None).unwrap().id, "y");
        assert!(lb.next_server(&[], None).is_none());
    }
}
