//! Fallback Resolver
//!
//! Decides, for a failed protected call, between propagating the error and
//! substituting a fixed value. Only infrastructure failures are ever
//! substituted: a `NotFound` from the operation always reaches the caller.

use tracing::{info, warn};

use crate::error::{CallError, CallResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPolicy<T> {
    /// Return the error unchanged
    Propagate,
    /// Return this value instead of an infrastructure failure
    Substitute(T),
}

pub fn resolve<T: Clone>(
    dependency: &str,
    error: CallError,
    policy: &FallbackPolicy<T>,
) -> CallResult<T> {
    match policy {
        FallbackPolicy::Substitute(value) if error.is_infrastructure() => {
            warn!(
                "Fallback triggered for {}, returning substitute value: {}",
                dependency, error
            );
            Ok(value.clone())
        }
        FallbackPolicy::Substitute(_) => {
            info!("{} domain error bypasses fallback: {}", dependency, error);
            Err(error)
        }
        FallbackPolicy::Propagate => Err(error),
    }
}
