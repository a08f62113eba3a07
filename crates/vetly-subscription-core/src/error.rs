//! Subscription engine errors

use thiserror::Error;
use vetly_types::RecordStatus;

/// Subscription engine errors
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// Bad input shape or range
    #[error("validation failed: {0}")]
    Validation(String),

    /// Requested coverage window overlaps an existing non-terminal record
    #[error("an active or upcoming subscription already overlaps this date range")]
    OverlappingSubscription,

    /// Action blocked while the clinic is suspended
    #[error("clinic is suspended; reactivate it before purchasing a new plan")]
    SuspendedClinic,

    /// Illegal transition attempted
    #[error("cannot {action} a subscription in status {from}")]
    InvalidStatusTransition {
        /// Current status of the targeted subscription
        from: RecordStatus,
        /// Attempted action
        action: &'static str,
    },

    /// Suspension blocked while an upcoming subscription is queued
    #[error("cannot suspend: an upcoming subscription exists")]
    UpcomingBlocks,

    /// Plan cannot be assigned to new subscriptions
    #[error("plan is not active")]
    InactivePlan,

    /// Payment method not available for new transactions
    #[error("payment method is not active")]
    InactivePaymentMethod,

    /// Clinic not found
    #[error("clinic not found")]
    ClinicNotFound,

    /// Subscription record not found
    #[error("subscription record not found")]
    RecordNotFound,

    /// Plan not found
    #[error("plan not found")]
    PlanNotFound,

    /// Payment method not found
    #[error("payment method not found")]
    PaymentMethodNotFound,

    /// Concurrent writers kept invalidating the transition; retries exhausted
    #[error("conflicting concurrent subscription change; please retry")]
    Conflict,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] vetly_db::DbError),
}

impl SubscriptionError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ClinicNotFound
                | Self::RecordNotFound
                | Self::PlanNotFound
                | Self::PaymentMethodNotFound
        )
    }
}
