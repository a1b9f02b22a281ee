//! Exponential backoff with jitter.
//!
//! Used by the selectors to pause between full passes over a pool whose
//! hosts are momentarily busy.

use rand::Rng;
use std::time::Duration;

/// Delay before pass `attempt` (1-based). `attempt == 0` never waits.
///
/// `base_ms * 2^(attempt - 1)`, capped at `max_ms`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
