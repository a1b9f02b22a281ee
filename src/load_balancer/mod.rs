//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request for service + strategy token
//!     → Strategy::from_str (closed set: roundRobin | random)
//!     → pool.rs (hosts registered for the service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (per-service wrap-around cursor)
//!         - random.rs (uniform draw)
//!     → counter.rs (admit the host if at or below threshold)
//!     → selector.rs (retry rounds, exhaustion detection)
//!     → Return host or error
//! ```
//!
//! # Design Decisions
//! - Algorithms only pick an index; load accounting lives in the selector
//! - Each strategy owns its own counter
//! - Registry is immutable after startup, so lookups take no locks

pub mod counter;
pub mod host;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProxyError;
use self::host::Host;

pub use counter::LoadCounter;
pub use pool::HostRegistry;
pub use selector::{Selection, Selector, Selectors};

/// A host-picking algorithm.
pub trait LoadBalancer: fmt::Debug + Send + Sync {
    /// Index into `hosts` of the next candidate for `service`, or `None`
    /// when there is nothing to pick from.
    fn pick(&self, service: &str, hosts: &[Host]) -> Option<usize>;
}

/// The selection strategies a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    RoundRobin,
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::RoundRobin, Strategy::Random];

    /// The token callers use to request this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "roundRobin",
            Strategy::Random => "random",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ProxyError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "roundRobin" => Ok(Strategy::RoundRobin),
            "random" => Ok(Strategy::Random),
            other => Err(ProxyError::UnknownStrategy(other.to_string())),
        }
    }
}
