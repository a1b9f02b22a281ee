//! Outbound forwarding to a selected host.
//!
//! # Responsibilities
//! - Serve repeat calls for a host from the response cache
//! - Issue `GET /{service}` with bounded connect, read and overall time
//! - Retry transient 503/504 answers, degrade to 500 once attempts run out
//! - Re-encode the payload and attach the outbound headers

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, UpstreamFailure};
use crate::load_balancer::host::Host;
use crate::observability::metrics;
use crate::proxy::cache::ResponseCache;
use crate::proxy::charset::to_utf8;
use crate::proxy::Forwarded;
use crate::resilience::retries::{is_transient, RetryPolicy};
use crate::resilience::timeouts::with_timeout;

const JSON_UTF8: &str = "application/json; charset=utf-8";
const MAX_BODY_BYTES: usize = 1024 * 1024;

enum AttemptOutcome {
    Transient(StatusCode),
    Done(Forwarded),
}

/// Forwards requests to upstream hosts.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    cache: Option<ResponseCache>,
    policy: RetryPolicy,
    read_timeout: Duration,
    cache_control: HeaderValue,
}

impl Forwarder {
    pub fn new(config: &ProxyConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(config.timeouts.connect_ms)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::from_config(&config.cache));

        let cache_control = HeaderValue::from_str(&format!("max-age={}", config.cache.max_age_secs))
            .unwrap_or_else(|_| HeaderValue::from_static("max-age=60"));

        Self {
            client,
            cache,
            policy: RetryPolicy::from(&config.retries),
            read_timeout: Duration::from_millis(config.timeouts.read_ms),
            cache_control,
        }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Forward a request to `host` and return its normalized result.
    pub async fn forward(&self, host: &Host) -> Result<Forwarded, ProxyError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(host) {
                tracing::debug!(host = %host, "Serving cached response");
                metrics::record_cache_lookup(true);
                return Ok(hit);
            }
            metrics::record_cache_lookup(false);
        }

        let start = Instant::now();
        let result = match with_timeout("forward", self.policy.deadline, self.attempt_all(host)).await {
            Ok(result) => result,
            Err(failure) => {
                tracing::error!(host = %host, error = %failure, "Forwarding deadline exceeded");
                Err(ProxyError::unreachable(host, failure))
            }
        };

        match &result {
            Ok(response) => {
                metrics::record_forward(host, response.status.as_u16(), start);
                if response.status == StatusCode::OK {
                    if let Some(cache) = &self.cache {
                        cache.put(host.clone(), response.clone());
                    }
                }
            }
            Err(_) => metrics::record_forward(host, StatusCode::BAD_GATEWAY.as_u16(), start),
        }
        result
    }

    async fn attempt_all(&self, host: &Host) -> Result<Forwarded, ProxyError> {
        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(host).await {
                Ok(AttemptOutcome::Done(response)) => {
                    metrics::record_upstream_attempt("ok");
                    return Ok(response);
                }
                Ok(AttemptOutcome::Transient(status)) => {
                    metrics::record_upstream_attempt("transient");
                    tracing::info!(
                        host = %host,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        status = %status,
                        "Transient upstream error, retrying"
                    );
                }
                Err(failure) => {
                    metrics::record_upstream_attempt("error");
                    tracing::error!(
                        host = %host,
                        attempt,
                        error = %failure,
                        "Error while talking to upstream"
                    );
                    return Err(ProxyError::unreachable(host, failure));
                }
            }
        }

        tracing::warn!(
            host = %host,
            attempts = self.policy.max_attempts,
            "Upstream stayed unavailable, giving up"
        );
        Ok(Forwarded::degraded())
    }

    async fn attempt(&self, host: &Host) -> Result<AttemptOutcome, UpstreamFailure> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(host.upstream_url())
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())?;

        let response = with_timeout("response", self.read_timeout, self.client.request(request)).await??;
        let status = response.status();
        if is_transient(status) {
            return Ok(AttemptOutcome::Transient(status));
        }

        let body = with_timeout(
            "body",
            self.read_timeout,
            axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES),
        )
        .await??;

        tracing::debug!(host = %host, upstream_status = %status, bytes = body.len(), "Upstream answered");
        Ok(AttemptOutcome::Done(self.success(body)))
    }

    fn success(&self, body: Bytes) -> Forwarded {
        let body = to_utf8(body);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        Forwarded {
            status: StatusCode::OK,
            headers,
            body,
        }
    }
}
