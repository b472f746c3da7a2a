//! Resilience layer for downstream calls
//!
//! - Rate limiter, circuit breaker and retry primitives
//! - `ResiliencePolicy`, which composes them in a fixed order around one call
//! - `ResilienceRegistry`, the process-wide policy table keyed by dependency
//! - Fallback resolution for callers that accept degraded data

pub mod circuit_breaker;
pub mod fallback;
pub mod policy;
pub mod rate_limiter;
pub mod registry;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, Permit,
};
pub use fallback::{resolve, FallbackPolicy};
pub use policy::ResiliencePolicy;
pub use rate_limiter::RateLimiter;
pub use registry::ResilienceRegistry;
pub use retry::RetryPolicy;
