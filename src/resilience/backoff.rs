//! Linear backoff.

use std::time::Duration;

/// Delay before retry `attempt` (1-based): `base_ms * attempt`.
pub fn calculate_backoff(attempt: u32, base_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    Duration::from_millis(base_ms.saturating_mul(attempt as u64))
}
