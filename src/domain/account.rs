use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[serde(alias = "savings", alias = "Savings")]
    Savings,
    #[serde(alias = "current", alias = "Current")]
    Current,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Savings => write!(f, "SAVINGS"),
            AccountType::Current => write!(f, "CURRENT"),
        }
    }
}

/// Account as returned by the account service. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, alias = "id")]
    pub account_id: Option<i64>,
    pub account_number: String,
    pub account_type: AccountType,
    pub initial_balance: Decimal,
    /// true while the account is open
    pub status: bool,
    #[serde(default)]
    pub customer_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_from_upstream_json() {
        let json = r#"{
            "id": 3,
            "accountNumber": "478758",
            "accountType": "SAVINGS",
            "initialBalance": "2000.00",
            "status": true,
            "customerId": 42
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.account_id, Some(3));
        assert_eq!(account.account_type, AccountType::Savings);
        assert_eq!(account.initial_balance, dec!(2000.00));
        assert_eq!(account.customer_id, Some(42));
    }
}
