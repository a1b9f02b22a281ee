//! Reverse proxy core.
//!
//! # Data Flow
//! ```text
//! (strategy, service)
//!     → load_balancer::Selector (host below threshold, call recorded)
//!     → forwarder.rs (cache, GET with retries, re-encode)
//!         → cache.rs
//!         → charset.rs
//!     → Forwarded (status, headers, body)
//! ```

pub mod cache;
pub mod charset;
pub mod forwarder;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::load_balancer::host::Host;
use crate::load_balancer::{HostRegistry, Selector, Selectors, Strategy};

pub use forwarder::Forwarder;

/// Normalized result of forwarding to one host.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarded {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Forwarded {
    /// The answer returned once every attempt met a transient status.
    pub fn degraded() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl IntoResponse for Forwarded {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Host registry, per-strategy selectors and the forwarder behind one handle.
#[derive(Debug)]
pub struct ReverseProxy {
    registry: Arc<HostRegistry>,
    selectors: Selectors,
    forwarder: Forwarder,
}

impl ReverseProxy {
    /// Build the proxy from validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let registry = Arc::new(HostRegistry::from_services(&config.services)?);
        let selectors = Selectors::new(registry.clone(), &config.balancing);

        tracing::info!(
            round_robin_threshold = config.balancing.round_robin_threshold,
            random_threshold = config.balancing.random_threshold,
            counter_window = ?config.balancing.counter_window(),
            "Selectors ready"
        );

        Ok(Self::new(registry, selectors, Forwarder::new(config)))
    }

    pub fn new(registry: Arc<HostRegistry>, selectors: Selectors, forwarder: Forwarder) -> Self {
        Self {
            registry,
            selectors,
            forwarder,
        }
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn selector(&self, strategy: Strategy) -> &Selector {
        self.selectors.get(strategy)
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Pick a host for `service` under `strategy`, recording the call.
    pub async fn select_host(&self, strategy: Strategy, service: &str) -> Result<Host, ProxyError> {
        self.selector(strategy).next(service).await
    }

    /// Like [`select_host`](Self::select_host) with the strategy given as its
    /// wire token (`roundRobin` or `random`).
    pub async fn select_host_by_token(&self, token: &str, service: &str) -> Result<Host, ProxyError> {
        let strategy: Strategy = token.parse()?;
        self.select_host(strategy, service).await
    }

    pub async fn forward(&self, host: &Host) -> Result<Forwarded, ProxyError> {
        self.forwarder.forward(host).await
    }

    /// Select a host and forward the call to it.
    pub async fn proxy(&self, strategy: Strategy, service: &str) -> Result<Forwarded, ProxyError> {
        let host = self.select_host(strategy, service).await?;
        tracing::debug!(strategy = %strategy, host = %host, "Host selected");
        self.forward(&host).await
    }
}
