//! Per-account movement fetcher.
//!
//! One branch of the report fan-out. A failure is contained to its account:
//! it is logged and degraded to an empty list, never returned.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::CallContext;
use crate::domain::{DateRange, Movement};
use crate::ports::MovementLookup;
use crate::resilience::ResiliencePolicy;

#[derive(Clone)]
pub struct MovementFetcher {
    lookup: Arc<dyn MovementLookup>,
    policy: Arc<ResiliencePolicy>,
}

impl MovementFetcher {
    pub fn new(lookup: Arc<dyn MovementLookup>, policy: Arc<ResiliencePolicy>) -> Self {
        Self { lookup, policy }
    }

    pub async fn fetch_movements(
        &self,
        account_number: &str,
        range: DateRange,
        context: &CallContext,
    ) -> Vec<Movement> {
        let result = self
            .policy
            .protect(|| {
                self.lookup
                    .movements_by_account_number(account_number, range, context)
            })
            .await;

        match result {
            Ok(movements) => {
                debug!(
                    "Fetched {} movements for account {}",
                    movements.len(),
                    account_number
                );
                movements
            }
            Err(err) => {
                warn!(
                    correlation_id = context.correlation_id(),
                    "Movements unavailable for account {}, continuing without them: {}",
                    account_number,
                    err
                );
                Vec::new()
            }
        }
    }
}
