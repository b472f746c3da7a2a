//! Dependency Circuit Breaker
//!
//! Sliding-window circuit breaker guarding calls to one named dependency.
//! Every attempt's outcome lands in a fixed-size window; once the window holds
//! enough calls and the failure rate reaches the threshold the circuit opens.
//!
//! ```text
//! Closed -> Open:     window >= minimum calls and failure rate >= threshold
//! Open -> HalfOpen:   cooldown elapsed (checked on the next admission)
//! HalfOpen -> Closed: every permitted probe succeeded
//! HalfOpen -> Open:   any probe failed
//! ```
//!
//! Admission hands out a [`Permit`] tagged with the breaker generation it was
//! granted in. Outcomes from an earlier generation are ignored, and a permit
//! dropped without an outcome gives its half-open slot back.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PolicyConfig;
use crate::error::{CallError, CallResult};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - all calls allowed
    Closed,
    /// Failure threshold exceeded - calls rejected
    Open,
    /// Cooldown elapsed - a bounded number of probes allowed
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Configuration for a dependency circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of most recent outcomes kept
    pub sliding_window_size: usize,
    /// Outcomes required before the failure rate is evaluated
    pub minimum_number_of_calls: usize,
    /// Failure rate in percent that trips the circuit
    pub failure_rate_threshold: f64,
    /// Time to wait before transitioning from Open to HalfOpen
    pub wait_duration_in_open_state: Duration,
    /// Probe calls admitted while HalfOpen
    pub permitted_calls_in_half_open_state: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for CircuitBreakerConfig {
    fn from(policy: &PolicyConfig) -> Self {
        Self {
            sliding_window_size: policy.sliding_window_size.max(1),
            minimum_number_of_calls: policy.minimum_number_of_calls.max(1),
            failure_rate_threshold: policy.failure_rate_threshold,
            wait_duration_in_open_state: policy.wait_duration_in_open_state(),
            permitted_calls_in_half_open_state: policy.permitted_calls_in_half_open_state.max(1),
        }
    }
}

/// Mutable breaker state, updated as one unit per admission or outcome
#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    /// Bumped on every transition
    generation: u64,
    /// true = failure
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_admitted: u32,
    half_open_successes: u32,
}

impl BreakerInner {
    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|failed| **failed).count();
        failures as f64 * 100.0 / self.window.len() as f64
    }
}

/// Circuit breaker for one downstream dependency
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    total_trips: AtomicU64,
    rejected_calls: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for `name`
    pub fn new(name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                generation: 0,
                window: VecDeque::with_capacity(config.sliding_window_size),
                opened_at: None,
                half_open_admitted: 0,
                half_open_successes: 0,
            }),
            config,
            total_trips: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
        }
    }

    /// Create with default configuration
    pub fn with_defaults(name: &str) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current state
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    // Never held across an await, so a poisoned lock still guards consistent data
    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admit or reject one attempt.
    ///
    /// An open circuit whose cooldown has elapsed moves to HalfOpen here and
    /// admits the caller as a probe. Each admitted HalfOpen call holds one
    /// probe slot until its permit is settled or dropped.
    pub fn try_acquire(&self) -> CallResult<Permit<'_>> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let cooled_down = inner
                .opened_at
                .map(|at| at.elapsed() >= self.config.wait_duration_in_open_state)
                .unwrap_or(false);
            if cooled_down {
                self.transition(&mut inner, CircuitState::HalfOpen);
            }
        }

        match inner.state {
            CircuitState::Closed => Ok(Permit::new(self, inner.generation, false)),
            CircuitState::HalfOpen
                if inner.half_open_admitted < self.config.permitted_calls_in_half_open_state =>
            {
                inner.half_open_admitted += 1;
                debug!(
                    "{} admitting probe {}/{}",
                    self.name, inner.half_open_admitted, self.config.permitted_calls_in_half_open_state
                );
                Ok(Permit::new(self, inner.generation, true))
            }
            CircuitState::Open | CircuitState::HalfOpen => {
                self.rejected_calls.fetch_add(1, Ordering::SeqCst);
                Err(CallError::CircuitOpen {
                    dependency: self.name.clone(),
                })
            }
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("{} ignoring success admitted before the last transition", self.name);
            return;
        }

        match inner.state {
            CircuitState::Closed => self.push_outcome(&mut inner, false),
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.permitted_calls_in_half_open_state {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64, error: &CallError) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(
                "{} ignoring failure admitted before the last transition: {}",
                self.name, error
            );
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                self.push_outcome(&mut inner, true);
                debug!(
                    "{} failure recorded ({:.1}% over {} calls): {}",
                    self.name,
                    inner.failure_rate(),
                    inner.window.len(),
                    error
                );
            }
            CircuitState::HalfOpen => {
                warn!("{} probe failed: {}", self.name, error);
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn on_abandoned(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation
            && inner.state == CircuitState::HalfOpen
            && inner.half_open_admitted > 0
        {
            inner.half_open_admitted -= 1;
            debug!("{} probe abandoned, slot released", self.name);
        }
    }

    fn push_outcome(&self, inner: &mut BreakerInner, failed: bool) {
        if inner.window.len() == self.config.sliding_window_size {
            inner.window.pop_front();
        }
        inner.window.push_back(failed);

        if inner.window.len() >= self.config.minimum_number_of_calls
            && inner.failure_rate() >= self.config.failure_rate_threshold
        {
            self.transition(inner, CircuitState::Open);
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        inner.generation += 1;
        inner.half_open_admitted = 0;
        inner.half_open_successes = 0;

        match to {
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
                self.total_trips.fetch_add(1, Ordering::SeqCst);
                warn!(
                    "{} circuit {} -> {} (failure rate {:.1}%)",
                    self.name,
                    from,
                    to,
                    inner.failure_rate()
                );
            }
            CircuitState::HalfOpen => {
                info!("{} circuit {} -> {}", self.name, from, to);
            }
            CircuitState::Closed => {
                inner.opened_at = None;
                inner.window.clear();
                info!("{} circuit {} -> {}", self.name, from, to);
            }
        }
    }

    /// Manually open the circuit
    pub fn force_open(&self) {
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Open);
    }

    /// Close the circuit and forget recorded outcomes
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Closed);
        inner.window.clear();
        warn!("{} circuit reset", self.name);
    }

    /// Get circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.lock();
        CircuitBreakerStats {
            name: self.name.clone(),
            state: inner.state,
            window_calls: inner.window.len(),
            failure_rate: inner.failure_rate(),
            total_trips: self.total_trips.load(Ordering::SeqCst),
            rejected_calls: self.rejected_calls.load(Ordering::SeqCst),
        }
    }
}

/// One admitted attempt.
///
/// Settle it with [`Permit::success`] or [`Permit::failure`]. Dropping it
/// unsettled (a cancelled caller, or an outcome the breaker should not count)
/// records nothing and frees its half-open slot.
#[must_use = "an unsettled permit records no outcome"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, probe: bool) -> Self {
        Self {
            breaker,
            generation,
            probe,
            settled: false,
        }
    }

    /// Admitted while half-open
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    pub fn failure(mut self, error: &CallError) {
        self.settled = true;
        self.breaker.on_failure(self.generation, error);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.on_abandoned(self.generation);
        }
    }
}

/// Statistics for monitoring
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub window_calls: usize,
    pub failure_rate: f64,
    pub total_trips: u64,
    pub rejected_calls: u64,
}
