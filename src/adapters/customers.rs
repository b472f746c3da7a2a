use async_trait::async_trait;

use super::RemoteClient;
use crate::domain::Customer;
use crate::error::{CallError, CallResult};
use crate::ports::CustomerLookup;

/// Customer service over HTTP: `GET /customers/{id}`
#[derive(Clone)]
pub struct HttpCustomerLookup {
    client: RemoteClient,
}

impl HttpCustomerLookup {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CustomerLookup for HttpCustomerLookup {
    async fn customer_by_id(&self, id: i64) -> CallResult<Customer> {
        self.client
            .get_json(&format!("/customers/{}", id), &[], None)
            .await
            .map_err(|err| match err {
                CallError::NotFound { target, .. } => CallError::NotFound {
                    target,
                    resource: format!("customer {}", id),
                },
                other => other,
            })
    }
}
