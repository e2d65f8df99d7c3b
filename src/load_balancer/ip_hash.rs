//! Client IP hash load balancing strategy.
//!
//! Plain modulo hashing: the candidate index is the sum of the four IPv4
//! octets modulo the candidate count. Changing the candidate set remaps most
//! clients; this is not a consistent-hash ring.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::load_balancer::Strategy;
use crate::registry::ServiceEndpoint;

#[derive(Debug, Default)]
pub struct IpHash;

impl IpHash {
    pub fn new() -> Self {
        Self
    }

    fn bucket(client_ip: Option<&str>, len: usize) -> usize {
        let Some(ip) = client_ip.and_then(|ip| ip.trim().parse::<Ipv4Addr>().ok()) else {
            return 0;
        };
        let sum: usize = ip.octets().iter().map(|&o| o as usize).sum();
        sum % len
    }
}

impl Strategy for IpHash {
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[Self::bucket(client_ip, candidates.len())].clone())
    }
}
