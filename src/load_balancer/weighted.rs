//! Weighted random load balancing strategy.

use rand::Rng;
use std::sync::Arc;

use crate::load_balancer::Strategy;
use crate::registry::ServiceEndpoint;

/// Draws a point in `[0, sum(weights))` and walks the candidates until the
/// point is used up. Zero-weight endpoints are never chosen.
#[derive(Debug, Default)]
pub struct Weighted;

impl Weighted {
    pub fn new() -> Self {
        Self
    }

    fn pick_with<R: Rng + ?Sized>(
        &self,
        candidates: &[Arc<ServiceEndpoint>],
        rng: &mut R,
    ) -> Option<Arc<ServiceEndpoint>> {
        let total: u64 = candidates.iter().map(|e| e.weight as u64).sum();
        if total == 0 {
            return None;
        }

        let mut point = rng.gen::<f64>() * total as f64;
        for candidate in candidates.iter().filter(|e| e.weight > 0) {
            point -= candidate.weight as f64;
            if point <= 0.0 {
                return Some(candidate.clone());
            }
        }
        // Float drift can leave a sliver past the last weight.
        candidates.iter().rev().find(|e| e.weight > 0).cloned()
    }
}

impl Strategy for Weighted {
    fn next_server(&self, candidates: &[Arc<ServiceEndpoint>], _client_ip: Option<&str>) -> Option<Arc<ServiceEndpoint>> {
        self.pick_with(candidates, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::endpoint_with_weight;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_distribution_follows_weights() {
        let lb = Weighted::new();
        let candidates = vec![
            endpoint_with_weight("a", 1),
            endpoint_with_weight("b", 1),
            endpoint_with_weight("c", 2),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..4000 {
            let picked = lb.pick_with(&candidates, &mut rng).unwrap();
            *counts.entry(picked.id.clone()).or_default() += 1;
        }

        for (id, expected) in [("a", 1000.0), ("b", 1000.0), ("c", 2000.0)] {
            let got = counts[id] as f64;
            assert!((got - expected).abs() <= expected * 0.1, "{} got {}", id, got);
        }
    }

    #[test]
    fn test_zero_weight_unreachable() {
        let lb = Weighted::new();
        let candidates = vec![endpoint_with_weight("zero", 0), endpoint_with_weight("one", 1)];
        for _ in 0..200 {
            assert_eq!(lb.next_server(&candidates, None).unwrap().id, "one");
        }
    }

    #[test]
    fn test_all_zero_weights_select_nothing() {
        let lb = Weighted::new();
        let candidates = vec![endpoint_with_weight("a", 0), endpoint_with_weight("b", 0)];
        assert!(lb.next_server(&candidates, None).is_none());
    }
}
