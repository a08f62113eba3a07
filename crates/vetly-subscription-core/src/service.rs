//! Subscription transition engine
//!
//! Thin orchestration over the pure state machine: read a clinic's
//! snapshot, plan the transition, apply it through the store's locked,
//! re-validated write. A concurrent writer invalidates the snapshot;
//! the engine then re-reads and re-plans, up to the configured attempt
//! budget.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;

use vetly_db::{
    ClinicRepository, DbError, PaymentMethodRepository, PlanRepository, SubscriptionRepository,
    TransitionPlan,
};
use vetly_types::{
    ActorId, ClinicId, ClinicStatus, PaymentMethodId, PlanId, RecordId, SubscriptionRecord,
};

use crate::clock::Clock;
use crate::config::SubscriptionConfig;
use crate::error::SubscriptionError;
use crate::machine;

/// New subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    /// Plan being purchased
    pub plan_id: PlanId,
    /// Payment channel used
    pub payment_method_id: PaymentMethodId,
    /// Amount recorded as paid, in cents
    pub amount_paid_cents: i64,
    /// First day of coverage
    pub start_date: NaiveDate,
    /// Free-text payment reference
    pub reference_number: String,
    /// Optional audit note
    pub comments: String,
    /// Extra staff accounts beyond the plan allowance
    pub extra_accounts: i32,
}

/// Subscription lifecycle engine, generic over its repositories
pub struct SubscriptionService<S, C, P, M> {
    pub(crate) subscriptions: Arc<S>,
    pub(crate) clinics: Arc<C>,
    plans: Arc<P>,
    payment_methods: Arc<M>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: SubscriptionConfig,
}

impl<S, C, P, M> SubscriptionService<S, C, P, M>
where
    S: SubscriptionRepository,
    C: ClinicRepository,
    P: PlanRepository,
    M: PaymentMethodRepository,
{
    /// Create a new subscription service
    pub fn new(
        subscriptions: Arc<S>,
        clinics: Arc<C>,
        plans: Arc<P>,
        payment_methods: Arc<M>,
        clock: Arc<dyn Clock>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            subscriptions,
            clinics,
            plans,
            payment_methods,
            clock,
            config,
        }
    }

    /// Purchase a new subscription for a clinic.
    ///
    /// Returns the created record (ACTIVE when coverage starts today or
    /// earlier, UPCOMING otherwise).
    #[instrument(skip(self, input), fields(clinic_id = %clinic_id))]
    pub async fn create_subscription(
        &self,
        clinic_id: ClinicId,
        input: CreateSubscription,
        actor: Option<ActorId>,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        let clinic = self
            .clinics
            .find_by_id(clinic_id.0)
            .await?
            .ok_or(SubscriptionError::ClinicNotFound)?
            .into_clinic();
        if clinic.is_deactivated {
            return Err(SubscriptionError::Validation(
                "clinic is deactivated".to_string(),
            ));
        }

        let plan = self
            .plans
            .find_by_id(input.plan_id.0)
            .await?
            .ok_or(SubscriptionError::PlanNotFound)?
            .into_plan();
        let method = self
            .payment_methods
            .find_by_id(input.payment_method_id.0)
            .await?
            .ok_or(SubscriptionError::PaymentMethodNotFound)?
            .into_payment_method();

        let applied = self
            .plan_and_apply(clinic_id, |records, today| {
                machine::plan_create(
                    records,
                    today,
                    clinic_id,
                    &plan,
                    &method,
                    &input,
                    actor,
                    &self.config,
                )
                .map(Some)
            })
            .await?
            .unwrap_or_default();

        // plan_create puts the new record last, after any closure row.
        applied
            .into_iter()
            .next_back()
            .ok_or_else(|| DbError::Corrupt("transition applied no rows".to_string()).into())
    }

    /// Suspend an ACTIVE subscription, freezing its remaining days
    #[instrument(skip(self, comment), fields(record_id = %record_id))]
    pub async fn suspend(
        &self,
        record_id: RecordId,
        comment: &str,
        actor: Option<ActorId>,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        self.transition(record_id, move |records, today| {
            machine::plan_suspend(records, record_id, today, comment, actor)
        })
        .await
    }

    /// Reactivate a SUSPENDED subscription, restoring its frozen days
    #[instrument(skip(self, comment), fields(record_id = %record_id))]
    pub async fn reactivate(
        &self,
        record_id: RecordId,
        comment: &str,
        actor: Option<ActorId>,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        self.transition(record_id, move |records, today| {
            machine::plan_reactivate(records, record_id, today, comment, actor)
        })
        .await
    }

    /// Refund a subscription, terminating its group
    #[instrument(skip(self, comment), fields(record_id = %record_id))]
    pub async fn refund(
        &self,
        record_id: RecordId,
        comment: &str,
        actor: Option<ActorId>,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        self.transition(record_id, move |records, today| {
            machine::plan_refund(records, record_id, today, comment, actor)
        })
        .await
    }

    /// The engine's current date, from the injected clock.
    ///
    /// Callers deriving dates for presentation should use this rather
    /// than the wall clock, so reported values agree with the dates the
    /// engine decides transitions by.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// A clinic's derived access status
    pub async fn clinic_status(
        &self,
        clinic_id: ClinicId,
    ) -> Result<ClinicStatus, SubscriptionError> {
        if self.clinics.find_by_id(clinic_id.0).await?.is_none() {
            return Err(SubscriptionError::ClinicNotFound);
        }
        let records = self.snapshot(clinic_id).await?;
        Ok(machine::derive_clinic_status(
            &records,
            self.config.upcoming_clinic_policy,
        ))
    }

    /// A clinic's full record history, oldest first
    pub async fn clinic_history(
        &self,
        clinic_id: ClinicId,
    ) -> Result<Vec<SubscriptionRecord>, SubscriptionError> {
        if self.clinics.find_by_id(clinic_id.0).await?.is_none() {
            return Err(SubscriptionError::ClinicNotFound);
        }
        self.snapshot(clinic_id).await
    }

    /// Batch loader: the current ACTIVE record per clinic, for callers
    /// that gate many clinics in one pass
    pub async fn active_records_for_clinics(
        &self,
        clinic_ids: &[ClinicId],
    ) -> Result<Vec<SubscriptionRecord>, SubscriptionError> {
        let ids: Vec<_> = clinic_ids.iter().map(|c| c.0).collect();
        let rows = self.subscriptions.active_heads_for_clinics(&ids).await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(SubscriptionError::Database))
            .collect()
    }

    /// Shared path for single-record transitions: locate the record's
    /// clinic, then plan and apply against its snapshot.
    async fn transition<F>(
        &self,
        record_id: RecordId,
        mut plan_fn: F,
    ) -> Result<SubscriptionRecord, SubscriptionError>
    where
        F: FnMut(&[SubscriptionRecord], NaiveDate) -> Result<TransitionPlan, SubscriptionError>,
    {
        let row = self
            .subscriptions
            .find_by_id(record_id.0)
            .await?
            .ok_or(SubscriptionError::RecordNotFound)?;
        let clinic_id = ClinicId(row.clinic_id);

        let applied = self
            .plan_and_apply(clinic_id, |records, today| {
                plan_fn(records, today).map(Some)
            })
            .await?
            .unwrap_or_default();
        applied
            .into_iter()
            .next_back()
            .ok_or_else(|| DbError::Corrupt("transition applied no rows".to_string()).into())
    }

    /// Plan against a fresh snapshot and apply; on a snapshot conflict,
    /// re-read and re-plan up to the configured attempt budget. The plan
    /// closure may return `Ok(None)` to signal nothing to do.
    pub(crate) async fn plan_and_apply<F>(
        &self,
        clinic_id: ClinicId,
        mut plan_fn: F,
    ) -> Result<Option<Vec<SubscriptionRecord>>, SubscriptionError>
    where
        F: FnMut(
            &[SubscriptionRecord],
            NaiveDate,
        ) -> Result<Option<TransitionPlan>, SubscriptionError>,
    {
        let attempts = self.config.max_apply_attempts.max(1);
        for attempt in 1..=attempts {
            let records = self.snapshot(clinic_id).await?;
            let today = self.clock.today();
            let Some(plan) = plan_fn(&records, today)? else {
                return Ok(None);
            };

            match self.subscriptions.apply(plan).await {
                Ok(rows) => {
                    let applied = rows
                        .into_iter()
                        .map(|row| row.try_into().map_err(SubscriptionError::Database))
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(Some(applied));
                }
                Err(DbError::Conflict) if attempt < attempts => {
                    tracing::debug!(
                        clinic_id = %clinic_id,
                        attempt,
                        "snapshot conflicted with a concurrent writer; re-planning"
                    );
                }
                Err(DbError::Conflict) => return Err(SubscriptionError::Conflict),
                Err(err) => return Err(err.into()),
            }
        }
        Err(SubscriptionError::Conflict)
    }

    /// Load a clinic's record history as domain records
    pub(crate) async fn snapshot(
        &self,
        clinic_id: ClinicId,
    ) -> Result<Vec<SubscriptionRecord>, SubscriptionError> {
        let rows = self.subscriptions.history_for_clinic(clinic_id.0).await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(SubscriptionError::Database))
            .collect()
    }
}
