//! Demo upstream servers.
//!
//! One small Axum server per configured host, answering `GET /{service}`
//! with the identity payload upstreams are expected to return:
//! `{"service": "<name>", "health": "UP", "port": <port>}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::load_balancer::host::Host;

#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub service: String,
    pub health: &'static str,
    pub port: u16,
}

/// A running demo server for one host.
#[derive(Debug)]
pub struct DemoBackend {
    host: Host,
    handle: JoinHandle<()>,
}

impl DemoBackend {
    /// Bind `host`'s address and port and serve until `shutdown` fires.
    pub async fn spawn(host: Host, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(host.authority()).await?;
        let local_addr = listener.local_addr()?;

        let app = router(Identity {
            service: host.service_name().to_string(),
            health: "UP",
            port: host.port(),
        });

        let label = host.to_string();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(backend = %label, error = %e, "Demo backend failed");
            }
        });

        tracing::info!(backend = %host, address = %local_addr, "Demo backend listening");
        Ok(Self { host, handle })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Wait for the server task to finish.
    pub async fn join(self) {
        let _ = self.handle.await;
    }

    /// Stop the server now and wait until its listener is closed.
    pub async fn abort(self) {
        self.handle.abort();
        let _ = self.handle.await;
        tracing::debug!(backend = %self.host, "Demo backend stopped");
    }
}

fn router(identity: Identity) -> Router {
    Router::new()
        .route("/{service}", get(identify))
        .with_state(identity)
}

async fn identify(State(identity): State<Identity>, Path(service): Path<String>) -> Response {
    if service != identity.service {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(identity).into_response()
}
