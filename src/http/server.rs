//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the liveness, proxy and admin handlers
//! - Wire up middleware (timeout, request ID, tracing)
//! - Bind server to listener and stop on the shutdown signal

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, ProxyQuery, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::proxy::ReverseProxy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ReverseProxy>,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ProxyConfig, proxy: Arc<ReverseProxy>) -> Self {
        let router = Self::build_router(config, AppState { proxy });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(root_handler))
            .route("/{service}", get(proxy_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(crate::admin::setup_admin_router(state));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with all layers, for driving the server without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn root_handler() -> &'static str {
    "Hello!!"
}

/// Select a host for the service with the requested strategy and forward.
async fn proxy_handler(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let start = Instant::now();

    let result = match query.strategy() {
        Ok(strategy) => state.proxy.proxy(strategy, &service).await,
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(forwarded) => forwarded.into_response(),
        Err(e) => {
            tracing::warn!(service = %service, error = %e, kind = e.kind(), "Proxy request failed");
            e.into_response()
        }
    };
    metrics::record_request("proxy", response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn router(toml: &str) -> Router {
        let config = parse_config(toml).unwrap();
        let proxy = Arc::new(ReverseProxy::from_config(&config).unwrap());
        HttpServer::new(&config, proxy).into_router()
    }

    fn request_to(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    const ONE_SERVICE: &str = r#"
        [[services]]
        name = "my-company"
        host = "127.0.0.1"
        ports = "9090"
    "#;

    #[tokio::test]
    async fn test_root_says_hello() {
        let response = router(ONE_SERVICE).oneshot(request_to("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(&X_REQUEST_ID));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hello!!");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/")
            .header(&X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = router(ONE_SERVICE).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[&X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_bad_request() {
        let response = router(ONE_SERVICE)
            .oneshot(request_to("/my-company?proxyType=leastConn"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_strategy_is_rejected() {
        let response = router(ONE_SERVICE).oneshot(request_to("/my-company")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "unknown_strategy");
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let response = router(ONE_SERVICE)
            .oneshot(request_to("/billing?proxyType=random"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_follow_config() {
        let response = router(ONE_SERVICE).oneshot(request_to("/admin/hosts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["name"], "my-company");
        assert_eq!(json[0]["hosts"][0]["port"], 9090);

        let disabled = format!("[admin]\nenabled = false\n{ONE_SERVICE}");
        let response = router(&disabled).oneshot(request_to("/admin/hosts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
