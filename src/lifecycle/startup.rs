//! Startup orchestration.
//!
//! Subsystems initialize in dependency order and the listener binds last,
//! so traffic only arrives once the registry and demo backends are ready.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::backend::DemoBackend;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::host::Host;
use crate::observability::metrics;
use crate::proxy::ReverseProxy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to start demo backend {host}: {source}")]
    DemoBackend {
        host: Host,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Handles to a started proxy.
#[derive(Debug)]
pub struct Running {
    pub local_addr: SocketAddr,
    pub proxy: Arc<ReverseProxy>,
    pub backends: Vec<DemoBackend>,
    pub server: JoinHandle<std::io::Result<()>>,
}

impl Running {
    /// Wait for the server and every demo backend to stop.
    pub async fn wait(self) -> std::io::Result<()> {
        let result = match self.server.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        };
        for backend in self.backends {
            backend.join().await;
        }
        result
    }
}

/// Start every subsystem described by `config`.
///
/// Tasks stop when `shutdown` is triggered.
pub async fn start(config: ProxyConfig, shutdown: &Shutdown) -> Result<Running, StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let proxy = Arc::new(ReverseProxy::from_config(&config)?);

    let mut backends = Vec::new();
    if config.demo_backends.enabled {
        for host in proxy.registry().all_hosts() {
            match DemoBackend::spawn(host.clone(), shutdown.subscribe()).await {
                Ok(backend) => backends.push(backend),
                Err(source) => {
                    stop_backends(backends).await;
                    return Err(StartupError::DemoBackend {
                        host: host.clone(),
                        source,
                    });
                }
            }
        }
    }

    let (listener, local_addr) = match bind_listener(&config.listener.bind_address).await {
        Ok(bound) => bound,
        Err(e) => {
            stop_backends(backends).await;
            return Err(e);
        }
    };

    let server = HttpServer::new(&config, proxy.clone());
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::info!(
        address = %local_addr,
        demo_backends = backends.len(),
        "Proxy ready"
    );

    Ok(Running {
        local_addr,
        proxy,
        backends,
        server,
    })
}

async fn bind_listener(address: &str) -> Result<(TcpListener, SocketAddr), StartupError> {
    let bind_error = |source| StartupError::Bind {
        address: address.to_string(),
        source,
    };
    let listener = TcpListener::bind(address).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;
    Ok((listener, local_addr))
}

/// Unwind demo backends started before a startup failure.
async fn stop_backends(backends: Vec<DemoBackend>) {
    for backend in backends {
        backend.abort().await;
    }
}
