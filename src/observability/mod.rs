//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Selection, forwarding, cache, HTTP layer produce:
//!     → logging.rs (structured log events, request id in span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (when enabled)
//! ```

pub mod logging;
pub mod metrics;
