//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// Doubles from `base_ms` per attempt, capped at `max_ms`, plus 0-10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped_ms = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = capped_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_ms + jitter)
}

/// Backoff for `attempt` using the configured delays.
pub fn backoff_for(config: &RetryConfig, attempt: u32) -> Duration {
    calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200 && b2.as_millis() < 220);
    }

    #[test]
    fn test_backoff_capped() {
        let capped = calculate_backoff(10, 100, 1000);
        assert!(capped.as_millis() >= 1000 && capped.as_millis() < 1100);

        let huge = calculate_backoff(u32::MAX, 100, 1000);
        assert!(huge.as_millis() < 1100);
    }

    #[test]
    fn test_zero_attempt_has_no_delay() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);
    }

    #[test]
    fn test_backoff_for_config() {
        let config = RetryConfig {
            base_delay_ms: 5,
            max_delay_ms: 5,
            ..RetryConfig::default()
        };
        assert_eq!(backoff_for(&config, 3), Duration::from_millis(5));
    }
}
