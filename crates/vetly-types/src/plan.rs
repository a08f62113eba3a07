//! Subscription plan types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Parse a plan ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subscription plan definition.
///
/// Immutable once referenced by subscription history; deletion is
/// blocked while any record references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Unique plan name
    pub name: String,
    /// Price in cents
    pub price_cents: i64,
    /// Coverage duration in days
    pub duration_days: i32,
    /// Total staff accounts allowed under this plan
    pub allowed_accounts: i32,
    /// Whether this plan can be assigned to new subscriptions
    pub is_active: bool,
}
