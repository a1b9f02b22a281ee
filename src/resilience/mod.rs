//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to host:
//!     → timeouts.rs (per-attempt and overall deadlines)
//!     → 503/504: retries.rs (consume attempt, try again)
//!
//! Select host:
//!     → busy pool: backoff.rs (pause between passes)
//! ```
//!
//! # Design Decisions
//! - Every outbound call has a deadline
//! - Only transient statuses are retried; hard failures surface at once

pub mod backoff;
pub mod retries;
pub mod timeouts;
