//! Random load balancing strategy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::load_balancer::host::Host;
use crate::load_balancer::LoadBalancer;

/// Uniform random selector.
#[derive(Debug)]
pub struct RandomPick {
    rng: Mutex<StdRng>,
}

impl RandomPick {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPick {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for RandomPick {
    fn pick(&self, _service: &str, hosts: &[Host]) -> Option<usize> {
        if hosts.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(rng.gen_range(0..hosts.len()))
    }
}
