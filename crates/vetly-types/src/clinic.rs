//! Clinic tenant types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique clinic identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClinicId(pub Uuid);

impl ClinicId {
    /// Parse a clinic ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for ClinicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived access status of a clinic.
///
/// Never stored; computed from the clinic's subscription record log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicStatus {
    /// No subscription records yet
    Inactive,
    /// Currently covered by an active subscription
    Active,
    /// Last subscription ended, was refunded, or is still upcoming
    Ended,
    /// Current subscription is suspended
    Suspended,
}

impl std::fmt::Display for ClinicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// A clinic tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    /// Clinic ID
    pub id: ClinicId,
    /// Clinic name
    pub name: String,
    /// Name of the owning account holder
    pub owner_name: String,
    /// Soft-delete flag, orthogonal to subscription status; disables
    /// all associated staff logins when set
    pub is_deactivated: bool,
    /// When the clinic was registered
    pub created_at: DateTime<Utc>,
}
