//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, host expansion)
//!     → ProxyConfig (validated, immutable)
//!     → host registry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; hosts never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BalancingConfig, CacheConfig, DemoBackendConfig, ListenerConfig,
    ObservabilityConfig, PortSpec, ProxyConfig, RetryConfig, ServiceConfig, TimeoutConfig,
};
pub use validation::ValidationError;
