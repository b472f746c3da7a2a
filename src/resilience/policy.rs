//! Resilience Policy Wrapper
//!
//! Decorates one asynchronous operation with, in this order:
//! 1. rate limit check (reject with `RateLimited`, operation not invoked)
//! 2. circuit breaker admission (reject with `CircuitOpen`, operation not invoked)
//! 3. retry loop over transient errors, every attempt recorded by the breaker
//! 4. one overall deadline covering every attempt and every backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CircuitBreaker, CircuitBreakerConfig, RateLimiter, RetryPolicy};
use crate::config::PolicyConfig;
use crate::error::{CallError, CallResult};

pub struct ResiliencePolicy {
    dependency: String,
    rate_limiter: RateLimiter,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ResiliencePolicy {
    pub fn new(dependency: &str, config: &PolicyConfig) -> Self {
        Self::from_parts(
            dependency,
            RateLimiter::from_policy(dependency, config),
            CircuitBreaker::new(dependency, CircuitBreakerConfig::from(config)),
            RetryPolicy::from(config),
            config.timeout(),
        )
    }

    pub fn from_parts(
        dependency: &str,
        rate_limiter: RateLimiter,
        breaker: CircuitBreaker,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            dependency: dependency.to_string(),
            rate_limiter,
            breaker,
            retry,
            timeout,
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Run `operation` under this policy.
    ///
    /// `operation` is invoked once per attempt. When the overall deadline
    /// passes, the in-flight attempt is dropped and recorded as a failure.
    /// When the next backoff would end past the deadline, the last attempt's
    /// error is returned without waiting.
    pub async fn protect<T, F, Fut>(&self, mut operation: F) -> CallResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CallResult<T>>,
    {
        self.rate_limiter.try_acquire()?;
        let mut permit = self.breaker.try_acquire()?;

        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut attempt: u32 = 1;

        loop {
            let result = match tokio::time::timeout_at(deadline, operation()).await {
                Ok(result) => result,
                Err(_) => Err(self.deadline_exceeded(started)),
            };

            let err = match result {
                Ok(value) => {
                    permit.success();
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", self.dependency, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if err.counts_as_failure() {
                permit.failure(&err);
            } else if err.is_rejection() {
                // Refused further down; says nothing about this dependency
                drop(permit);
            } else {
                // The dependency answered; a domain error is not its failure
                permit.success();
            }

            if !self.retry.should_retry(&err, attempt) {
                return Err(err);
            }

            let delay = self.retry.delay_for_attempt(attempt);
            if Instant::now() + delay >= deadline {
                warn!(
                    "{} deadline of {}ms leaves no room for attempt {}, giving up with {:?}: {}",
                    self.dependency,
                    self.timeout.as_millis(),
                    attempt + 1,
                    err.kind(),
                    err
                );
                return Err(err);
            }

            warn!(
                "Retry attempt {} for {} in {}ms: {}",
                attempt,
                self.dependency,
                delay.as_millis(),
                err
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            permit = self.breaker.try_acquire()?;
        }
    }

    fn deadline_exceeded(&self, started: Instant) -> CallError {
        CallError::Timeout {
            target: self.dependency.clone(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32, timeout: Duration) -> ResiliencePolicy {
        let config = PolicyConfig {
            max_attempts,
            retry_wait_ms: 100,
            timeout_ms: timeout.as_millis() as u64,
            ..Default::default()
        };
        ResiliencePolicy::new("movementService", &config)
    }

    fn timeout_error() -> CallError {
        CallError::Timeout {
            target: "movementService".to_string(),
            elapsed_ms: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_until_success() {
        let policy = policy(3, Duration::from_secs(5));
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .protect(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(timeout_error())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let policy = policy(3, Duration::from_secs(5));
        let calls = Arc::new(AtomicU32::new(0));

        let result: CallResult<()> = policy
            .protect(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CallError::Unavailable {
                        target: "movementService".to_string(),
                        status: Some(400),
                        message: "bad request".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(CallError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_the_whole_loop() {
        let policy = policy(10, Duration::from_millis(250));
        let calls = Arc::new(AtomicU32::new(0));

        let result: CallResult<()> = policy
            .protect(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err(timeout_error())
                }
            })
            .await;

        assert!(matches!(result, Err(CallError::Timeout { .. })));
        // 100ms attempt + 100ms wait + 100ms attempt would pass 250ms
        assert!(calls.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_is_abandoned_at_deadline() {
        let policy = policy(1, Duration::from_millis(50));

        let result: CallResult<()> = policy
            .protect(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(CallError::Timeout { .. })));
        assert_eq!(policy.circuit_breaker().stats().window_calls, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_checked_before_operation() {
        let config = PolicyConfig {
            rate_limit_for_period: 1,
            rate_limit_refresh_period_ms: 3_600_000,
            ..Default::default()
        };
        let policy = ResiliencePolicy::new("customerService", &config);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let _ = policy
                .protect(move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CallError>(())
                    }
                })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(policy.rate_limiter().rejected_calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_a_breaker_failure() {
        let config = PolicyConfig {
            minimum_number_of_calls: 1,
            sliding_window_size: 1,
            ..Default::default()
        };
        let policy = ResiliencePolicy::new("customerService", &config);

        let result: CallResult<()> = policy
            .protect(|| async {
                Err(CallError::NotFound {
                    target: "customerService".to_string(),
                    resource: "customer 9".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(CallError::NotFound { .. })));
        assert_eq!(policy.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_open_circuit_never_invokes_operation() {
        let policy = ResiliencePolicy::from_parts(
            "accountService",
            RateLimiter::new("accountService", 10, Duration::from_secs(1)),
            CircuitBreaker::with_defaults("accountService"),
            RetryPolicy::no_retry(),
            Duration::from_secs(1),
        );
        policy.circuit_breaker().force_open();
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .protect(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CallError>(())
                }
            })
            .await;

        assert_eq!(
            result,
            Err(CallError::CircuitOpen {
                dependency: "accountService".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_past_deadline_returns_last_error() {
        let config = PolicyConfig {
            max_attempts: 3,
            retry_wait_ms: 10_000,
            timeout_ms: 5_000,
            ..Default::default()
        };
        let policy = ResiliencePolicy::new("accountService", &config);
        let calls = Arc::new(AtomicU32::new(0));

        let result: CallResult<()> = policy
            .protect(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CallError::Unavailable {
                        target: "accountService".to_string(),
                        status: Some(503),
                        message: "maintenance".to_string(),
                    })
                }
            })
            .await;

        assert!(
            matches!(result, Err(CallError::Unavailable { status: Some(503), .. })),
            "got {result:?}"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_does_not_wedge_the_breaker() {
        let policy = policy(1, Duration::from_secs(5));
        policy.circuit_breaker().force_open();
        tokio::time::advance(Duration::from_secs(10)).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            policy.protect(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, CallError>(())
            }),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(policy.circuit_breaker().state(), CircuitState::HalfOpen);

        let result = policy.protect(|| async { Ok::<_, CallError>("ok") }).await;
        assert_eq!(result, Ok("ok"));
        assert_eq!(policy.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_from_operation_frees_probe_slot() {
        let policy = policy(1, Duration::from_secs(5));
        policy.circuit_breaker().force_open();
        tokio::time::advance(Duration::from_secs(10)).await;

        let rejected: CallResult<()> = policy
            .protect(|| async {
                Err(CallError::RateLimited {
                    dependency: "downstream".to_string(),
                })
            })
            .await;
        assert!(matches!(rejected, Err(CallError::RateLimited { .. })));
        assert_eq!(policy.circuit_breaker().state(), CircuitState::HalfOpen);

        let result = policy.protect(|| async { Ok::<_, CallError>(1) }).await;
        assert_eq!(result, Ok(1));
        assert_eq!(policy.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_outcomes_are_all_recorded() {
        let config = PolicyConfig {
            sliding_window_size: 40,
            minimum_number_of_calls: 40,
            failure_rate_threshold: 50.0,
            max_attempts: 1,
            ..Default::default()
        };
        let policy = Arc::new(ResiliencePolicy::new("movementService", &config));

        let handles: Vec<_> = (0..40u32)
            .map(|i| {
                let policy = policy.clone();
                tokio::spawn(async move {
                    policy
                        .protect(move || async move {
                            tokio::task::yield_now().await;
                            if i % 2 == 0 {
                                Ok(i)
                            } else {
                                Err(CallError::Unavailable {
                                    target: "movementService".to_string(),
                                    status: Some(400),
                                    message: "rejected".to_string(),
                                })
                            }
                        })
                        .await
                })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let succeeded = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        assert_eq!(succeeded, 20);

        // The trip needs all 40 outcomes, so every caller was admitted first
        let stats = policy.circuit_breaker().stats();
        assert_eq!(stats.window_calls, 40);
        assert_eq!(stats.total_trips, 1);
        assert_eq!(stats.rejected_calls, 0);
        assert_eq!(stats.state, CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_only_permitted_probes_under_contention() {
        let config = PolicyConfig {
            permitted_calls_in_half_open_state: 2,
            max_attempts: 1,
            ..Default::default()
        };
        let policy = ResiliencePolicy::new("customerService", &config);
        policy.circuit_breaker().force_open();
        tokio::time::advance(Duration::from_secs(10)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let callers = (0..6).map(|_| {
            let calls = calls.clone();
            let policy = &policy;
            async move {
                policy
                    .protect(|| {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok::<_, CallError>(())
                        }
                    })
                    .await
            }
        });
        let results = futures::future::join_all(callers).await;

        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(CallError::CircuitOpen { .. })))
            .count();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(rejected, 4);
        assert_eq!(policy.circuit_breaker().state(), CircuitState::Closed);
    }
}
