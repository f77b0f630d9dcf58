//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed dispatch is worth retrying
//! - Produce the delay schedule for retry attempts
//!
//! # Design Decisions
//! - Only failures with no response are retried; an HTTP status is an answer
//! - A call is retried at most once as a whole (the retried flag); the
//!   bounded attempt loop lives in the client

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry schedule for network failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: if config.enabled { config.max_attempts } else { 0 },
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay.as_millis() as u64)
    }

    /// `(attempt, delay)` for every retry the policy allows.
    pub fn schedule(&self) -> impl Iterator<Item = (u32, Duration)> + '_ {
        (1..=self.max_attempts).map(move |attempt| (attempt, self.delay(attempt)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// True when the transport produced no HTTP response at all.
pub fn is_retryable(error: &reqwest::Error) -> bool {
    error.status().is_none()
        && (error.is_connect() || error.is_timeout() || error.is_request() || error.is_body())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        let schedule: Vec<_> = policy.schedule().collect();
        assert_eq!(
            schedule,
            vec![
                (1, Duration::from_millis(1000)),
                (2, Duration::from_millis(2000)),
                (3, Duration::from_millis(3000)),
            ]
        );
    }

    #[test]
    fn test_disabled_config_yields_no_retries() {
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).schedule().count(), 0);
        assert_eq!(RetryPolicy::disabled().schedule().count(), 0);
    }
}
