//! Payment method types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique payment method identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentMethodId(pub Uuid);

impl PaymentMethodId {
    /// Parse a payment method ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for PaymentMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named payment channel (e.g. Visa, Cash).
///
/// Deletion is blocked while referenced by subscription history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Payment method ID
    pub id: PaymentMethodId,
    /// Channel name
    pub name: String,
    /// Whether this method is available for new transactions
    pub is_active: bool,
}
