//! Error taxonomy shared by selection and forwarding.

use std::time::Duration;
use thiserror::Error;

use crate::load_balancer::host::Host;

/// Errors surfaced by the proxy core.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed startup host data. Fatal at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No host was configured for the requested service.
    #[error("unknown service `{0}`")]
    UnknownService(String),

    /// The strategy token does not name a known selection strategy.
    #[error("unknown strategy `{0}`, expected `roundRobin` or `random`")]
    UnknownStrategy(String),

    /// Every host of the service is past its threshold.
    #[error("all hosts for service `{0}` are busy")]
    PoolExhausted(String),

    /// Hard transport failure talking to a specific host.
    #[error("upstream {host} unreachable: {source}")]
    UpstreamUnreachable {
        host: Host,
        #[source]
        source: UpstreamFailure,
    },
}

/// Underlying cause of an [`ProxyError::UpstreamUnreachable`].
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    /// Connection refused, reset, malformed response, connect timeout.
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// A deadline elapsed before the upstream answered.
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    /// The outbound request could not be built from the host record.
    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl ProxyError {
    /// Wrap a failure cause for the given host.
    pub fn unreachable(host: &Host, source: impl Into<UpstreamFailure>) -> Self {
        ProxyError::UpstreamUnreachable {
            host: host.clone(),
            source: source.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidConfiguration(_) => "invalid_configuration",
            ProxyError::UnknownService(_) => "unknown_service",
            ProxyError::UnknownStrategy(_) => "unknown_strategy",
            ProxyError::PoolExhausted(_) => "pool_exhausted",
            ProxyError::UpstreamUnreachable { .. } => "upstream_unreachable",
        }
    }
}
