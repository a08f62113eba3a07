//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Clinic repository trait
#[async_trait]
pub trait ClinicRepository: Send + Sync {
    /// Find a clinic by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ClinicRow>>;

    /// Register a new clinic
    async fn create(&self, clinic: CreateClinic) -> DbResult<ClinicRow>;

    /// Set the soft-delete flag
    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> DbResult<()>;
}

/// Create clinic input
#[derive(Debug, Clone)]
pub struct CreateClinic {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
}

/// Plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Find a plan by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>>;

    /// List all plans
    async fn list(&self) -> DbResult<Vec<PlanRow>>;

    /// Create a new plan
    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow>;

    /// Delete a plan; fails with [`crate::DbError::InUse`] while any
    /// subscription record references it
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create plan input
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub duration_days: i32,
    pub allowed_accounts: i32,
}

/// Payment method repository trait
#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Find a payment method by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentMethodRow>>;

    /// List all payment methods
    async fn list(&self) -> DbResult<Vec<PaymentMethodRow>>;

    /// Create a new payment method
    async fn create(&self, method: CreatePaymentMethod) -> DbResult<PaymentMethodRow>;

    /// Delete a payment method; fails with [`crate::DbError::InUse`]
    /// while any subscription record references it
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create payment method input
#[derive(Debug, Clone)]
pub struct CreatePaymentMethod {
    pub id: Uuid,
    pub name: String,
}

/// Subscription record repository trait.
///
/// The record log is append-only: there is no update method. All writes
/// go through [`SubscriptionRepository::apply`], which serializes
/// writers per clinic and re-validates the snapshot the transition was
/// planned from.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a record by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Full record history for a clinic, ordered by (activation_date, seq)
    async fn history_for_clinic(&self, clinic_id: Uuid) -> DbResult<Vec<SubscriptionRow>>;

    /// Clinics with a group head that is due for reconciliation:
    /// an UPCOMING head with start_date <= today, or an ACTIVE head with
    /// end_date < today
    async fn clinics_due_for_reconciliation(&self, today: NaiveDate) -> DbResult<Vec<Uuid>>;

    /// Batch loader: the ACTIVE head record for each of the given
    /// clinics, where one exists
    async fn active_heads_for_clinics(&self, clinic_ids: &[Uuid])
        -> DbResult<Vec<SubscriptionRow>>;

    /// Atomically apply a planned transition.
    ///
    /// Takes the clinic's writer lock, verifies that no record was
    /// appended since the plan's snapshot was read, and inserts the new
    /// rows. Returns [`crate::DbError::Conflict`] on a stale snapshot so
    /// the caller can re-plan.
    async fn apply(&self, plan: TransitionPlan) -> DbResult<Vec<SubscriptionRow>>;
}

/// A planned state transition: rows to append, valid only against the
/// snapshot identified by `expected_max_seq`.
///
/// Because the log is append-only, the clinic's subscription state is
/// fully determined by which rows exist; the greatest `seq` therefore
/// identifies the snapshot a plan was computed from.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// Clinic whose records are being transitioned
    pub clinic_id: Uuid,
    /// Greatest seq in the snapshot the plan was computed from; 0 when
    /// the clinic had no records
    pub expected_max_seq: i64,
    /// Rows to append
    pub inserts: Vec<NewSubscriptionRecord>,
}

/// Insert input for one subscription record row
#[derive(Debug, Clone)]
pub struct NewSubscriptionRecord {
    pub id: Uuid,
    pub group_id: Uuid,
    pub clinic_id: Uuid,
    pub plan_id: Uuid,
    pub payment_method_id: Uuid,
    pub amount_paid_cents: i64,
    pub reference_number: String,
    pub extra_accounts: i32,
    pub comments: String,
    pub activated_by: Option<Uuid>,
    pub activation_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frozen_days_remaining: Option<i32>,
    pub status: String,
}
