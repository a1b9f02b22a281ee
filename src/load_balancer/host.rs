//! Host abstraction.
//!
//! # Responsibilities
//! - Represent a single backend instance of a named service
//! - Value semantics: two hosts with the same fields are the same host
//! - Build the upstream URI the forwarder calls

use std::fmt;
use std::sync::Arc;

/// A single backend instance, identified by service name, address and port.
///
/// Immutable once constructed. Cloning is cheap (shared strings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Host {
    service_name: Arc<str>,
    address: Arc<str>,
    port: u16,
}

impl Host {
    /// Create a new host record.
    pub fn new(service_name: &str, address: &str, port: u16) -> Self {
        Self {
            service_name: Arc::from(service_name),
            address: Arc::from(address),
            port,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `address:port`, as used for the authority of upstream requests.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// `http://{address}:{port}/{service}`.
    pub fn upstream_url(&self) -> String {
        format!("http://{}/{}", self.authority(), self.service_name)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.service_name, self.address, self.port)
    }
}
