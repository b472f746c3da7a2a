use async_trait::async_trait;
use tracing::debug;

use super::{CallContext, RemoteClient};
use crate::domain::Account;
use crate::error::CallResult;
use crate::ports::AccountLookup;

/// Account service over HTTP: `GET /accounts?customerId={id}`
#[derive(Clone)]
pub struct HttpAccountLookup {
    client: RemoteClient,
}

impl HttpAccountLookup {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountLookup for HttpAccountLookup {
    async fn accounts_by_customer_id(
        &self,
        customer_id: &str,
        context: &CallContext,
    ) -> CallResult<Vec<Account>> {
        let accounts: Vec<Account> = self
            .client
            .get_json(
                "/accounts",
                &[("customerId", customer_id.to_string())],
                Some(context),
            )
            .await?;

        debug!("Found {} accounts for customer {}", accounts.len(), customer_id);
        Ok(accounts)
    }
}
