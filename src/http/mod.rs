//! Inbound HTTP handling.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, timeout / request ID / trace layers)
//!     → request.rs (request ID, proxyType query)
//!     → proxy::ReverseProxy (select + forward)
//!     → response.rs (ProxyError → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ProxyQuery, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
