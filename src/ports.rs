//! Collaborator interfaces of the aggregation layer.
//!
//! Each port is one downstream read. Implementations classify their own
//! failures; retries, breakers and fallbacks are applied by the caller.

use async_trait::async_trait;

use crate::adapters::CallContext;
use crate::domain::{Account, Customer, DateRange, Movement};
use crate::error::CallResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn accounts_by_customer_id(
        &self,
        customer_id: &str,
        context: &CallContext,
    ) -> CallResult<Vec<Account>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovementLookup: Send + Sync {
    /// Movements of one account inside `range`, in upstream order
    async fn movements_by_account_number(
        &self,
        account_number: &str,
        range: DateRange,
        context: &CallContext,
    ) -> CallResult<Vec<Movement>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// Fails with `CallError::NotFound` when the id does not exist
    async fn customer_by_id(&self, id: i64) -> CallResult<Customer>;
}
