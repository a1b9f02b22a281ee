//! Timeout enforcement.
//!
//! Wraps Tokio's timeout so upstream calls report which stage ran out of
//! time. Connect timeouts are enforced by the connector itself.

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamFailure;

/// Run `future` with a deadline, mapping expiry to `UpstreamFailure::Timeout`.
pub async fn with_timeout<F, T>(
    stage: &'static str,
    after: Duration,
    future: F,
) -> Result<T, UpstreamFailure>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| UpstreamFailure::Timeout { stage, after })
}
