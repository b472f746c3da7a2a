use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Account, Movement, MovementType};
use crate::error::{FlujoError, Result};

/// Inclusive date window for movement queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(FlujoError::InvalidRequest(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }
}

/// Credit and debit totals, always derived from a movement list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_credits: Decimal,
    pub total_debits: Decimal,
}

impl Summary {
    pub fn from_movements(movements: &[Movement]) -> Self {
        movements
            .iter()
            .fold(Summary::default(), |mut summary, movement| {
                match movement.movement_type {
                    MovementType::Credit => summary.total_credits += movement.value,
                    MovementType::Debit => summary.total_debits += movement.value,
                }
                summary
            })
    }

    /// Credits minus debits
    pub fn net(&self) -> Decimal {
        self.total_credits - self.total_debits
    }
}

/// Request-scoped aggregate of a customer's accounts and their movements.
///
/// The summary is computed at construction from the same movement list the
/// report carries, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    accounts: Vec<Account>,
    movements: Vec<Movement>,
    summary: Summary,
}

impl Report {
    pub fn new(accounts: Vec<Account>, movements: Vec<Movement>) -> Self {
        let summary = Summary::from_movements(&movements);
        Self {
            accounts,
            movements,
            summary,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}
