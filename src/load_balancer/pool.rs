//! Host registry.
//!
//! # Responsibilities
//! - Group the flat host list by service name, preserving insertion order
//! - Answer `hosts_for(service)` for the selectors
//! - Reject malformed host data at construction

use std::collections::HashMap;

use crate::config::schema::ServiceConfig;
use crate::config::validation::expand_service;
use crate::error::ProxyError;
use crate::load_balancer::host::Host;

/// Immutable mapping of service name → ordered hosts.
#[derive(Debug, Default)]
pub struct HostRegistry {
    groups: HashMap<String, Vec<Host>>,
    /// Service names in first-seen order.
    order: Vec<String>,
}

impl HostRegistry {
    /// Group an already materialized host list.
    pub fn new(hosts: Vec<Host>) -> Self {
        let mut groups: HashMap<String, Vec<Host>> = HashMap::new();
        let mut order = Vec::new();

        for host in hosts {
            let bucket = groups.entry(host.service_name().to_string()).or_insert_with(|| {
                order.push(host.service_name().to_string());
                Vec::new()
            });
            bucket.push(host);
        }

        Self { groups, order }
    }

    /// Build the registry from configured `(service, ip, ports)` entries.
    pub fn from_services(entries: &[ServiceConfig]) -> Result<Self, ProxyError> {
        let mut hosts = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let expanded = expand_service(index, entry)
                .map_err(|e| ProxyError::InvalidConfiguration(e.to_string()))?;
            hosts.extend(expanded);
        }

        let registry = Self::new(hosts);
        tracing::info!(
            services = registry.order.len(),
            hosts = registry.len(),
            "Host registry built"
        );
        Ok(registry)
    }

    /// Hosts registered for `service`, in registry order.
    pub fn hosts_for(&self, service: &str) -> Result<&[Host], ProxyError> {
        match self.groups.get(service) {
            Some(hosts) if !hosts.is_empty() => Ok(hosts),
            _ => Err(ProxyError::UnknownService(service.to_string())),
        }
    }

    /// Service names in first-seen order.
    pub fn services(&self) -> &[String] {
        &self.order
    }

    /// Every host, grouped by service in first-seen order.
    pub fn all_hosts(&self) -> impl Iterator<Item = &Host> {
        self.order
            .iter()
            .filter_map(|name| self.groups.get(name))
            .flat_map(|hosts| hosts.iter())
    }

    /// Total number of hosts.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
