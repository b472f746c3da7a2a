//! Per-dependency call quota.
//!
//! `limit_for_period` calls per `refresh_period`, replenished continuously.
//! Callers over quota are rejected immediately instead of waiting.

use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

use crate::config::PolicyConfig;
use crate::error::{CallError, CallResult};

pub struct RateLimiter {
    name: String,
    limiter: Governor<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>,
    rejected: AtomicU64,
}

impl RateLimiter {
    pub fn new(name: &str, limit_for_period: u32, refresh_period: Duration) -> Self {
        let burst = NonZeroU32::new(limit_for_period).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(refresh_period / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            name: name.to_string(),
            limiter: Governor::direct(quota),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn from_policy(name: &str, policy: &PolicyConfig) -> Self {
        Self::new(
            name,
            policy.rate_limit_for_period,
            policy.rate_limit_refresh_period(),
        )
    }

    /// Take one permit or fail with `RateLimited`
    pub fn try_acquire(&self) -> CallResult<()> {
        self.limiter.check().map_err(|_| {
            let rejected = self.rejected.fetch_add(1, Ordering::SeqCst) + 1;
            warn!("Rate limiter {} rejected call ({} total)", self.name, rejected);
            CallError::RateLimited {
                dependency: self.name.clone(),
            }
        })
    }

    pub fn rejected_calls(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }
}
