//! Subscription record types
//!
//! A subscription record is one row in the append-only lifecycle log:
//! one episode of a subscription in a specific status. Causally related
//! records (the same paid plan moving through states) share a
//! [`GroupId`]; the newest record of a group is that group's current
//! state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VetlyError;
use crate::{ClinicId, PaymentMethodId, PlanId};

/// Unique subscription record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Parse a record ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation token shared by all records of one logical subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Generate a fresh group ID for a new purchase
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the operator who performed a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Queued future plan, not yet serving
    Upcoming,
    /// Currently serving
    Active,
    /// Coverage over; terminal for this record
    Ended,
    /// Frozen by a suspend action
    Suspended,
    /// Refunded; terminal for this record
    Refunded,
}

impl RecordStatus {
    /// Whether this status permits no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Refunded)
    }

    /// Database representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Active => "ACTIVE",
            Self::Ended => "ENDED",
            Self::Suspended => "SUSPENDED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = VetlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(Self::Upcoming),
            "ACTIVE" => Ok(Self::Active),
            "ENDED" => Ok(Self::Ended),
            "SUSPENDED" => Ok(Self::Suspended),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(VetlyError::InvalidStatus(other.to_string())),
        }
    }
}

/// One subscription episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Record ID
    pub id: RecordId,
    /// Total insertion order; tie-breaker for same-day activations
    pub seq: i64,
    /// Group correlation token
    pub group_id: GroupId,
    /// Owning clinic
    pub clinic_id: ClinicId,
    /// Plan purchased
    pub plan_id: PlanId,
    /// Payment channel used
    pub payment_method_id: PaymentMethodId,
    /// Amount recorded as paid, in cents (recorded, never charged)
    pub amount_paid_cents: i64,
    /// Free-text payment reference
    pub reference_number: String,
    /// Extra staff accounts purchased beyond the plan allowance
    pub extra_accounts: i32,
    /// Human-readable audit text, append-only by convention
    pub comments: String,
    /// Operator who created this record; None if the actor was deleted
    pub activated_by: Option<ActorId>,
    /// Date the record was created; immutable
    pub activation_date: NaiveDate,
    /// Coverage window start
    pub start_date: NaiveDate,
    /// Coverage window end
    pub end_date: NaiveDate,
    /// Remaining coverage days frozen by a suspend action
    pub frozen_days_remaining: Option<i32>,
    /// Record status
    pub status: RecordStatus,
}

impl SubscriptionRecord {
    /// Remaining coverage days as of `today`.
    ///
    /// Non-zero only for ACTIVE records; this is the value frozen into a
    /// suspend record so reactivation restores the exact remaining
    /// duration.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        if self.status == RecordStatus::Active {
            (self.end_date - today).num_days().max(0)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            RecordStatus::Upcoming,
            RecordStatus::Active,
            RecordStatus::Ended,
            RecordStatus::Suspended,
            RecordStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<RecordStatus>().unwrap(), status);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(RecordStatus::Ended.is_terminal());
        assert!(RecordStatus::Refunded.is_terminal());
        assert!(!RecordStatus::Upcoming.is_terminal());
        assert!(!RecordStatus::Active.is_terminal());
        assert!(!RecordStatus::Suspended.is_terminal());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("CANCELED".parse::<RecordStatus>().is_err());
    }
}
