//! Round-robin load balancing strategy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::host::Host;
use crate::load_balancer::pool::HostRegistry;
use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Keeps one wrap-around cursor per service name, created at startup.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursors: HashMap<String, AtomicUsize>,
}

impl RoundRobin {
    /// One cursor per service known to the registry.
    pub fn new(registry: &HostRegistry) -> Self {
        let cursors = registry
            .services()
            .iter()
            .map(|name| (name.clone(), AtomicUsize::new(0)))
            .collect();
        Self { cursors }
    }
}

impl LoadBalancer for RoundRobin {
    fn pick(&self, service: &str, hosts: &[Host]) -> Option<usize> {
        if hosts.is_empty() {
            return None;
        }
        let cursor = self.cursors.get(service)?;
        let position = cursor.fetch_add(1, Ordering::Relaxed);
        Some(position % hosts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HostRegistry {
        HostRegistry::new(vec![
            Host::new("svc", "127.0.0.1", 9001),
            Host::new("svc", "127.0.0.1", 9002),
            Host::new("other", "127.0.0.1", 9100),
            Host::new("svc", "127.0.0.1", 9003),
        ])
    }

    #[test]
    fn test_round_robin() {
        let registry = registry();
        let lb = RoundRobin::new(&registry);
        let hosts = registry.hosts_for("svc").unwrap();

        let picks: Vec<usize> = (0..7).map(|_| lb.pick("svc", hosts).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_cursors_are_per_service() {
        let registry = registry();
        let lb = RoundRobin::new(&registry);
        let svc = registry.hosts_for("svc").unwrap();
        let other = registry.hosts_for("other").unwrap();

        assert_eq!(lb.pick("svc", svc), Some(0));
        assert_eq!(lb.pick("other", other), Some(0));
        assert_eq!(lb.pick("svc", svc), Some(1));
        assert_eq!(lb.pick("other", other), Some(0));
    }

    #[test]
    fn test_unknown_service_has_no_cursor() {
        let registry = registry();
        let lb = RoundRobin::new(&registry);
        let hosts = registry.hosts_for("svc").unwrap();
        assert_eq!(lb.pick("missing", hosts), None);
        assert_eq!(lb.pick("svc", &[]), None);
    }
}
