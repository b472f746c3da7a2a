use serde::{Deserialize, Serialize};

/// Identification carried by the placeholder customer.
pub const FALLBACK_IDENTIFICATION: &str = "UNKNOWN";
pub const FALLBACK_FULL_NAME: &str = "Unknown Customer";
pub const FALLBACK_EMAIL: &str = "unknown@email.com";
pub const FALLBACK_PHONE: &str = "0000000000";
pub const FALLBACK_ADDRESS: &str = "Unknown Address";

/// Customer as returned by the customer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub full_name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    pub identification: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "celular")]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub active: bool,
}

impl Customer {
    /// Well-known substitute returned when the customer service is degraded.
    /// Never persisted.
    pub fn placeholder() -> Self {
        Self {
            customer_id: None,
            full_name: FALLBACK_FULL_NAME.to_string(),
            gender: None,
            age: None,
            identification: FALLBACK_IDENTIFICATION.to_string(),
            address: FALLBACK_ADDRESS.to_string(),
            phone: FALLBACK_PHONE.to_string(),
            email: FALLBACK_EMAIL.to_string(),
            active: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.identification == FALLBACK_IDENTIFICATION && !self.active
    }
}
