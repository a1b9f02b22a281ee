//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Expand service entries into hosts, rejecting missing fields and bad ports
//! - Validate value ranges (attempts > 0, capacity > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, ServiceConfig};
use crate::load_balancer::host::Host;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service entry #{index} has no name")]
    MissingServiceName { index: usize },

    #[error("service `{service}` has no host address")]
    MissingHost { service: String },

    #[error("service `{service}` has no ports")]
    MissingPorts { service: String },

    #[error("service `{service}` has invalid port `{port}`")]
    InvalidPort { service: String, port: String },

    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("cache.capacity must be at least 1")]
    ZeroCacheCapacity,
}

/// Parse one port token. Ports are non-negative integers that fit in 16 bits.
pub fn parse_port(service: &str, token: &str) -> Result<u16, ValidationError> {
    token.trim().parse::<u16>().map_err(|_| ValidationError::InvalidPort {
        service: service.to_string(),
        port: token.to_string(),
    })
}

/// Expand one service entry into a host per port, in port-list order.
pub fn expand_service(index: usize, entry: &ServiceConfig) -> Result<Vec<Host>, ValidationError> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingServiceName { index });
    }
    let address = entry.host.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingHost {
            service: name.to_string(),
        });
    }

    let tokens = entry.ports.tokens();
    if tokens.is_empty() {
        return Err(ValidationError::MissingPorts {
            service: name.to_string(),
        });
    }

    tokens
        .iter()
        .map(|token| parse_port(name, token).map(|port| Host::new(name, address, port)))
        .collect()
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    for (index, entry) in config.services.iter().enumerate() {
        if let Err(e) = expand_service(index, entry) {
            errors.push(e);
        }
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if config.cache.capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
