//! Client-facing error responses.
//!
//! Maps each `ProxyError` to a status code and a small JSON body:
//! `{"error": "<kind>", "message": "<display>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ProxyError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ProxyError {
    /// Status code reported to clients for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UnknownService(_) => StatusCode::NOT_FOUND,
            ProxyError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            ProxyError::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
