//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use service_proxy::config::{parse_config, ProxyConfig};
use service_proxy::load_balancer::host::Host;

/// What a mock backend sends for one request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A raw-TCP backend bound on an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn host(&self, service: &str) -> Host {
        Host::new(service, &self.addr.ip().to_string(), self.addr.port())
    }
}

/// Start a backend that answers every request with the same reply.
pub async fn start_mock_backend(reply: Reply) -> MockBackend {
    start_programmable_backend(move |_| reply.clone()).await
}

/// Start a backend whose reply depends on the zero-based request number.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(usize) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let mut socket = socket;
                        if read_request_head(&mut socket).await.is_none() {
                            return;
                        }
                        let n = counter.fetch_add(1, Ordering::SeqCst);
                        let reply = f(n);
                        if !reply.delay.is_zero() {
                            tokio::time::sleep(reply.delay).await;
                        }
                        let _ = socket.write_all(&encode(&reply)).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, hits }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_request_head(socket: &mut TcpStream) -> Option<()> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Some(());
        }
    }
}

fn encode(reply: &Reply) -> Vec<u8> {
    let status_text = match reply.status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        504 => "504 Gateway Timeout",
        _ => "200 OK",
    };
    let mut out = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_text,
        reply.body.len()
    )
    .into_bytes();
    out.extend_from_slice(&reply.body);
    out
}

/// A validated config whose single service `name` lists `ports` on 127.0.0.1.
pub fn config_for(name: &str, ports: &[u16]) -> ProxyConfig {
    let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
    parse_config(&format!(
        r#"
        [listener]
        bind_address = "127.0.0.1:0"

        [[services]]
        name = "{name}"
        host = "127.0.0.1"
        ports = "{}"
        "#,
        ports.join(",")
    ))
    .unwrap()
}

/// Identity payload a well-behaved upstream returns.
pub fn identity(service: &str, port: u16) -> String {
    format!(r#"{{"service":"{service}","health":"UP","port":{port}}}"#)
}
