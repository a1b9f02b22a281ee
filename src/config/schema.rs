//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service definitions; each expands into one host per port.
    pub services: Vec<ServiceConfig>,

    /// Selection thresholds and counter behaviour.
    pub balancing: BalancingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration for transient upstream errors.
    pub retries: RetryConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,

    /// Built-in demo upstream servers.
    pub demo_backends: DemoBackendConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One `(service, ip, ports)` triple.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, also the upstream request path.
    pub name: String,

    /// Host or IP address the service listens on.
    pub host: String,

    /// A single port, a comma-separated list ("9001,9002") or an array.
    pub ports: PortSpec,
}

/// Port list as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortSpec {
    Number(i64),
    Text(String),
    List(Vec<PortSpec>),
}

impl Default for PortSpec {
    fn default() -> Self {
        PortSpec::Text(String::new())
    }
}

impl PortSpec {
    /// Flatten into raw tokens, trimming whitespace and skipping empty pieces.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            PortSpec::Number(n) => vec![n.to_string()],
            PortSpec::Text(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            PortSpec::List(items) => items.iter().flat_map(PortSpec::tokens).collect(),
        }
    }
}

/// Selection thresholds and counter behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancingConfig {
    /// Calls after which a host is busy for round-robin.
    pub round_robin_threshold: u64,

    /// Calls after which a host is busy for random selection.
    pub random_threshold: u64,

    /// When set, a host tally resets once this many seconds have passed
    /// since its first recorded call. Unset or `0` keeps counters monotonic.
    pub counter_window_secs: Option<u64>,

    /// Selection rounds `Selector::next` attempts before its final sweep.
    pub max_selection_rounds: u32,

    /// Base delay for backoff between selection rounds in milliseconds.
    pub backoff_base_ms: u64,

    /// Maximum delay for backoff between selection rounds in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            round_robin_threshold: 10,
            random_threshold: 3,
            counter_window_secs: None,
            max_selection_rounds: 32,
            backoff_base_ms: 1,
            backoff_max_ms: 20,
        }
    }
}

impl BalancingConfig {
    /// Counter window, `None` for monotonic counters.
    pub fn counter_window(&self) -> Option<Duration> {
        self.counter_window_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Per-attempt timeout for the upstream response and body in milliseconds.
    pub read_ms: u64,

    /// Inbound request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 100,
            read_ms: 2000,
            request_secs: 30,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per forward, the first one included.
    pub max_attempts: u32,

    /// Deadline across all attempts of one forward in milliseconds.
    pub deadline_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            deadline_ms: 5000,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the response cache.
    pub enabled: bool,

    /// Entry lifetime in seconds. Unset or `0` keeps entries for the process
    /// lifetime, like the monotonic counters; capacity still bounds memory.
    pub ttl_secs: Option<u64>,

    /// Maximum number of cached hosts; the oldest entry is evicted beyond it.
    pub capacity: usize,

    /// `max-age` advertised in the `Cache-Control` response header.
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: None,
            capacity: 1024,
            max_age_secs: 60,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime, `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/admin/hosts` and `/admin/load`.
    pub enabled: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Demo upstream servers started alongside the proxy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoBackendConfig {
    /// Start one demo server per configured host.
    pub enabled: bool,
}
