use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Movement direction. The value itself is always a non-negative magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    #[serde(alias = "credit", alias = "Credit")]
    Credit,
    #[serde(alias = "debit", alias = "Debit")]
    Debit,
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::Credit => write!(f, "CREDIT"),
            MovementType::Debit => write!(f, "DEBIT"),
        }
    }
}

/// Movement as returned by the movement service. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    #[serde(default, alias = "id")]
    pub movement_id: Option<i64>,
    pub account_number: String,
    #[serde(alias = "type")]
    pub movement_type: MovementType,
    pub value: Decimal,
    /// Account balance right after this movement
    pub balance: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
}

impl Movement {
    pub fn new(account_number: &str, movement_type: MovementType, value: Decimal) -> Self {
        Self {
            movement_id: None,
            account_number: account_number.to_string(),
            movement_type,
            value,
            balance: Decimal::ZERO,
            date: None,
        }
    }

    pub fn is_credit(&self) -> bool {
        self.movement_type == MovementType::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.movement_type == MovementType::Debit
    }
}
