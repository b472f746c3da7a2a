use async_trait::async_trait;

use super::{CallContext, RemoteClient};
use crate::domain::{DateRange, Movement};
use crate::error::CallResult;
use crate::ports::MovementLookup;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Movement service over HTTP:
/// `GET /movements?accountNumber=..&startDate=..&endDate=..`
#[derive(Clone)]
pub struct HttpMovementLookup {
    client: RemoteClient,
}

impl HttpMovementLookup {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MovementLookup for HttpMovementLookup {
    async fn movements_by_account_number(
        &self,
        account_number: &str,
        range: DateRange,
        context: &CallContext,
    ) -> CallResult<Vec<Movement>> {
        let query = [
            ("accountNumber", account_number.to_string()),
            ("startDate", range.start_date.format(DATE_FORMAT).to_string()),
            ("endDate", range.end_date.format(DATE_FORMAT).to_string()),
        ];

        self.client
            .get_json("/movements", &query, Some(context))
            .await
    }
}
