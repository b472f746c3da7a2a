//! Process-wide table of resilience policies keyed by dependency name.
//!
//! A dependency's policy (and with it its breaker window and rate limiter) is
//! created on first use and lives until the process exits. Every caller that
//! names the same dependency shares the same state.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

use super::{CircuitBreakerStats, ResiliencePolicy};
use crate::config::ResilienceConfig;
use crate::error::CallResult;

pub struct ResilienceRegistry {
    config: ResilienceConfig,
    policies: DashMap<String, Arc<ResiliencePolicy>>,
}

impl ResilienceRegistry {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            policies: DashMap::new(),
        }
    }

    /// Policy for `dependency`, created on first use
    pub fn policy(&self, dependency: &str) -> Arc<ResiliencePolicy> {
        if let Some(policy) = self.policies.get(dependency) {
            return policy.value().clone();
        }

        self.policies
            .entry(dependency.to_string())
            .or_insert_with(|| {
                let config = self.config.policy_for(dependency);
                info!(
                    "Registering resilience policy for {} (window {}, threshold {}%, {} attempts, {}ms deadline)",
                    dependency,
                    config.sliding_window_size,
                    config.failure_rate_threshold,
                    config.max_attempts,
                    config.timeout_ms
                );
                Arc::new(ResiliencePolicy::new(dependency, &config))
            })
            .value()
            .clone()
    }

    /// Run `operation` under the policy registered for `dependency`
    pub async fn protect<T, F, Fut>(&self, dependency: &str, operation: F) -> CallResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CallResult<T>>,
    {
        self.policy(dependency).protect(operation).await
    }

    /// Names of every dependency used so far, sorted
    pub fn dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Breaker statistics for every dependency used so far, sorted by name
    pub fn snapshot(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<CircuitBreakerStats> = self
            .policies
            .iter()
            .map(|e| e.value().circuit_breaker().stats())
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}
