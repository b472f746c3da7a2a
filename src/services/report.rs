//! Report Aggregator
//!
//! Builds a customer's report from two services:
//! 1. Fetch the customer's accounts (failures propagate)
//! 2. Fan out one movement fetch per account, joined on all branches
//! 3. Flatten the movements and derive the summary from that exact list

use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::MovementFetcher;
use crate::adapters::CallContext;
use crate::domain::{DateRange, Movement, Report};
use crate::error::{CallError, FlujoError, Result};
use crate::ports::AccountLookup;
use crate::resilience::ResiliencePolicy;

pub const CUSTOMER_ID_REQUIRED: &str = "Customer ID cannot be null or empty";

pub struct ReportAggregator {
    accounts: Arc<dyn AccountLookup>,
    account_policy: Arc<ResiliencePolicy>,
    movements: MovementFetcher,
}

impl ReportAggregator {
    pub fn new(
        accounts: Arc<dyn AccountLookup>,
        account_policy: Arc<ResiliencePolicy>,
        movements: MovementFetcher,
    ) -> Self {
        Self {
            accounts,
            account_policy,
            movements,
        }
    }

    /// Generate the report for `customer_id` over `[start_date, end_date]`.
    ///
    /// Fails with `InvalidRequest` before any remote call when the id is
    /// blank or the window is inverted. A movement fetch failure never fails
    /// the report; an account fetch failure always does.
    pub async fn generate_report(
        &self,
        customer_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        context: &CallContext,
    ) -> Result<Report> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() {
            return Err(FlujoError::InvalidRequest(CUSTOMER_ID_REQUIRED.to_string()));
        }
        let range = DateRange::new(start_date, end_date)?;

        match self.assemble(customer_id, range, context).await {
            Ok(report) => {
                info!(
                    correlation_id = context.correlation_id(),
                    "Report generated successfully for customer {} ({} accounts, {} movements, net {})",
                    customer_id,
                    report.accounts().len(),
                    report.movements().len(),
                    report.summary().net()
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    correlation_id = context.correlation_id(),
                    "Error generating report for customer {}: {}", customer_id, err
                );
                Err(err)
            }
        }
    }

    async fn assemble(
        &self,
        customer_id: &str,
        range: DateRange,
        context: &CallContext,
    ) -> Result<Report> {
        let accounts = self
            .account_policy
            .protect(|| self.accounts.accounts_by_customer_id(customer_id, context))
            .await
            .map_err(|err| account_failure(customer_id, err))?;

        debug!("Found {} accounts for customer {}", accounts.len(), customer_id);

        if accounts.is_empty() {
            return Ok(Report::empty());
        }

        let branches = accounts
            .iter()
            .map(|account| {
                self.movements
                    .fetch_movements(&account.account_number, range, context)
            });
        let per_account: Vec<Vec<Movement>> = join_all(branches).await;

        let movements: Vec<Movement> = per_account.into_iter().flatten().collect();
        Ok(Report::new(accounts, movements))
    }
}

/// Classified failures keep their kind; anything else is wrapped with the
/// customer id.
fn account_failure(customer_id: &str, err: CallError) -> FlujoError {
    match err {
        CallError::InvalidResponse { .. } => FlujoError::ReportGenerationFailed {
            customer_id: customer_id.to_string(),
            source: Box::new(FlujoError::Remote(err)),
        },
        other => other.into(),
    }
}
