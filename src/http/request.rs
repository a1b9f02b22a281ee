//! Inbound request extraction.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) for requests that arrive without one
//! - Parse the `proxyType` query parameter

use axum::http::{HeaderName, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::ProxyError;
use crate::load_balancer::Strategy;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Issues UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Query string of `GET /{service}`.
///
/// `proxyType` is optional at the extractor so a missing token reports the
/// same `UnknownStrategy` error as a misspelled one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(rename = "proxyType")]
    pub proxy_type: Option<String>,
}

impl ProxyQuery {
    pub fn strategy(&self) -> Result<Strategy, ProxyError> {
        match &self.proxy_type {
            Some(token) => token.parse(),
            None => Err(ProxyError::UnknownStrategy(String::new())),
        }
    }
}
