//! Retry logic for upstream calls.
//!
//! # Responsibilities
//! - Classify transient upstream statuses (503, 504)
//! - Bound attempts per forward and the wall-clock time they may take
//!
//! # Design Decisions
//! - Only GET is forwarded, so every attempt is idempotent
//! - Transport failures are not retried; they surface immediately
//! - Attempts run back to back; the deadline bounds the total

use axum::http::StatusCode;
use std::time::Duration;

use crate::config::RetryConfig;

/// True for statuses that mean "temporarily unavailable, try again".
pub fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Attempt bound and overall deadline for one forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, deadline: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            deadline,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.deadline_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient(StatusCode::GATEWAY_TIMEOUT));
        for status in [
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            assert!(!is_transient(status), "{status} must not be retried");
        }
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.deadline, Duration::from_secs(5));

        // At least one attempt is always made.
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts, 1);
    }
}
