//! service-proxy
//!
//! Reverse proxy that spreads calls for a logical service across its
//! configured hosts.
//!
//! ```text
//!   GET /{service}?proxyType=roundRobin|random
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────────┐   ┌────────────┐   ┌──────────┐
//!   │  http    │──▶│ load_balancer    │──▶│ forwarder  │──▶│ upstream │
//!   │  server  │   │ selector+counter │   │ cache/retry│   │   host   │
//!   └──────────┘   └──────────────────┘   └────────────┘   └──────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use service_proxy::config::{load_config, ProxyConfig};
use service_proxy::lifecycle::{self, signals, Shutdown};
use service_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "service-proxy")]
#[command(about = "Threshold-aware reverse proxy", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start one demo upstream per configured host.
    #[arg(long)]
    demo_backends: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if args.demo_backends {
        config.demo_backends.enabled = true;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("service-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let running = lifecycle::start(config, &shutdown).await?;

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    running.wait().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
