//! Retry delay schedules.
//!
//! Transport failures back off exponentially; rate-limit failures wait out
//! the cooldown the gateway reported. Both are capped.

use std::time::Duration;

/// `base_ms * 2^attempt`, capped at `max_ms`.
///
/// `attempt` is the number of retries already scheduled, so the first retry
/// waits `base_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Wait for a server-stated cooldown of `retry_after_secs`, capped at `max_ms`.
pub fn cooldown(retry_after_secs: u64, max_ms: u64) -> Duration {
    Duration::from_millis(retry_after_secs.saturating_mul(1000).min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 1000, 10_000), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(1, 1000, 10_000), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(2, 1000, 10_000), Duration::from_millis(4000));
        assert_eq!(calculate_backoff(4, 1000, 10_000), Duration::from_millis(10_000));
    }

    #[test]
    fn backoff_never_overflows() {
        assert_eq!(calculate_backoff(200, 1000, 10_000), Duration::from_millis(10_000));
        assert_eq!(calculate_backoff(63, u64::MAX, 5), Duration::from_millis(5));
    }

    #[test]
    fn cooldown_is_capped() {
        assert_eq!(cooldown(5, 60_000), Duration::from_secs(5));
        assert_eq!(cooldown(600, 60_000), Duration::from_secs(60));
        assert_eq!(cooldown(0, 60_000), Duration::ZERO);
    }
}
