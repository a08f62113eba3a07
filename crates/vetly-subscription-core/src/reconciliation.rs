//! Daily reconciliation sweep
//!
//! Applies the time-triggered transitions: UPCOMING records whose start
//! date has arrived become ACTIVE (ending any subscription they
//! supersede) and ACTIVE records past their end date become ENDED.
//!
//! The sweep is idempotent: each pass re-plans from the current record
//! snapshot, and a group whose head already moved on matches nothing.
//! Clinics fail independently; one clinic's error is logged and counted
//! without aborting the sweep.

use chrono::NaiveDate;
use tracing::instrument;

use vetly_db::{ClinicRepository, PaymentMethodRepository, PlanRepository, SubscriptionRepository};
use vetly_types::ClinicId;

use crate::error::SubscriptionError;
use crate::machine;
use crate::service::SubscriptionService;

/// Outcome of one reconciliation sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Date the sweep ran as
    pub date: NaiveDate,
    /// Clinics that had a record due for transition
    pub clinics_due: u64,
    /// Clinics whose records actually changed
    pub clinics_changed: u64,
    /// Records moved UPCOMING -> ACTIVE
    pub activated: u64,
    /// Records moved to ENDED
    pub expired: u64,
    /// Clinics skipped because their transition failed
    pub failed: u64,
}

/// Changes applied to a single clinic by one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicReconciliation {
    /// Records moved UPCOMING -> ACTIVE
    pub activated: u64,
    /// Records moved to ENDED
    pub expired: u64,
}

impl<S, C, P, M> SubscriptionService<S, C, P, M>
where
    S: SubscriptionRepository,
    C: ClinicRepository,
    P: PlanRepository,
    M: PaymentMethodRepository,
{
    /// Run one reconciliation sweep over every clinic with a due record
    #[instrument(skip(self))]
    pub async fn run_daily_reconciliation(&self) -> Result<ReconciliationReport, SubscriptionError> {
        let today = self.clock.today();
        let due = self.subscriptions.clinics_due_for_reconciliation(today).await?;

        let mut report = ReconciliationReport {
            date: today,
            clinics_due: due.len() as u64,
            clinics_changed: 0,
            activated: 0,
            expired: 0,
            failed: 0,
        };

        for clinic_id in due {
            let clinic_id = ClinicId(clinic_id);
            match self.reconcile_clinic(clinic_id).await {
                Ok(Some(change)) => {
                    report.clinics_changed += 1;
                    report.activated += change.activated;
                    report.expired += change.expired;
                }
                Ok(None) => {}
                Err(err) => {
                    // Leave the clinic for the next sweep.
                    tracing::warn!(clinic_id = %clinic_id, error = %err, "clinic reconciliation failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            date = %report.date,
            clinics_due = report.clinics_due,
            clinics_changed = report.clinics_changed,
            activated = report.activated,
            expired = report.expired,
            failed = report.failed,
            "reconciliation sweep complete"
        );
        Ok(report)
    }

    /// Reconcile a single clinic. Returns `None` when nothing was due,
    /// which also holds when another writer reconciled it first.
    pub async fn reconcile_clinic(
        &self,
        clinic_id: ClinicId,
    ) -> Result<Option<ClinicReconciliation>, SubscriptionError> {
        let mut change = ClinicReconciliation {
            activated: 0,
            expired: 0,
        };
        let applied = self
            .plan_and_apply(clinic_id, |records, today| {
                match machine::plan_reconcile(records, today) {
                    Some(reconcile) => {
                        change.activated = reconcile.activated;
                        change.expired = reconcile.expired;
                        Ok(Some(reconcile.plan))
                    }
                    None => Ok(None),
                }
            })
            .await?;
        Ok(applied.map(|_| change))
    }
}
