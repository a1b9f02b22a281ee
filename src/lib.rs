//! Service proxy library: threshold-aware host selection and forwarding.

pub mod admin;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::Strategy;
pub use proxy::{Forwarded, ReverseProxy};
