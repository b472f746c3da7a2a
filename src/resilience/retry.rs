use std::time::Duration;

use crate::config::PolicyConfig;
use crate::error::CallError;

/// Bounded retry with exponential backoff between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_wait: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for RetryPolicy {
    fn from(policy: &PolicyConfig) -> Self {
        Self {
            max_attempts: policy.max_attempts.max(1),
            initial_wait: Duration::from_millis(policy.retry_wait_ms),
            multiplier: policy.retry_backoff_multiplier.max(1.0),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_wait: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_wait.as_millis() as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }

    /// Whether `error` from attempt number `attempt` deserves another try
    pub fn should_retry(&self, error: &CallError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_wait: Duration::from_millis(100),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        let policy = RetryPolicy::default();
        let timeout = CallError::Timeout {
            target: "movementService".to_string(),
            elapsed_ms: 10,
        };
        let bad_request = CallError::Unavailable {
            target: "movementService".to_string(),
            status: Some(400),
            message: "bad date".to_string(),
        };

        assert!(policy.should_retry(&timeout, 1));
        assert!(policy.should_retry(&timeout, 2));
        assert!(!policy.should_retry(&timeout, 3));
        assert!(!policy.should_retry(&bad_request, 1));
    }
}
