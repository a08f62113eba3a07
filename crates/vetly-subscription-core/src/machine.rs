//! Subscription state machine
//!
//! Pure functions over a clinic's record snapshot plus "today". Nothing
//! here touches storage: each operation validates its preconditions and
//! returns a [`TransitionPlan`] of rows to append, which the store
//! applies atomically against the same snapshot.
//!
//! State model: records sharing a group id form one logical
//! subscription; the newest record of a group (by activation date, then
//! seq) is that group's **head** and carries its current status. A head
//! in ENDED or REFUNDED is terminal. Legal transitions:
//!
//! ```text
//! UPCOMING --(reconciliation: start_date <= today)--> ACTIVE
//! ACTIVE   --(reconciliation: end_date < today)-----> ENDED
//! ACTIVE   --(suspend)------------------------------> SUSPENDED
//! SUSPENDED--(reactivate)---------------------------> ACTIVE
//! ACTIVE | SUSPENDED | UPCOMING --(refund)----------> REFUNDED
//! ```

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use vetly_db::{NewSubscriptionRecord, TransitionPlan};
use vetly_types::{
    ActorId, ClinicId, ClinicStatus, PaymentMethod, Plan, RecordId, RecordStatus,
    SubscriptionRecord,
};

use crate::config::{SubscriptionConfig, UpcomingClinicPolicy};
use crate::error::SubscriptionError;
use crate::service::CreateSubscription;

/// Greatest seq in the snapshot; identifies the state a plan was
/// computed from (0 when the clinic has no records).
pub fn max_seq(records: &[SubscriptionRecord]) -> i64 {
    records.iter().map(|r| r.seq).max().unwrap_or(0)
}

/// The head (newest record) of every group, newest group activity first.
///
/// `records` must be sorted ascending by (activation_date, seq), as the
/// store returns them.
pub fn group_heads(records: &[SubscriptionRecord]) -> Vec<&SubscriptionRecord> {
    let mut by_group: HashMap<Uuid, &SubscriptionRecord> = HashMap::new();
    for record in records {
        by_group.insert(record.group_id.0, record);
    }
    let mut heads: Vec<&SubscriptionRecord> = by_group.into_values().collect();
    heads.sort_by_key(|r| std::cmp::Reverse((r.activation_date, r.seq)));
    heads
}

/// Derive a clinic's access status from its record log.
///
/// The newest non-UPCOMING head decides: ACTIVE and SUSPENDED map
/// directly, terminal heads map to Ended. A queued UPCOMING plan never
/// masks a live subscription. No records at all derives Inactive; only
/// UPCOMING records derive per `policy`.
pub fn derive_clinic_status(
    records: &[SubscriptionRecord],
    policy: UpcomingClinicPolicy,
) -> ClinicStatus {
    if records.is_empty() {
        return ClinicStatus::Inactive;
    }

    for head in group_heads(records) {
        match head.status {
            RecordStatus::Upcoming => continue,
            RecordStatus::Active => return ClinicStatus::Active,
            RecordStatus::Suspended => return ClinicStatus::Suspended,
            RecordStatus::Ended | RecordStatus::Refunded => return ClinicStatus::Ended,
        }
    }

    // Only UPCOMING records exist.
    match policy {
        UpcomingClinicPolicy::Ended => ClinicStatus::Ended,
        UpcomingClinicPolicy::Inactive => ClinicStatus::Inactive,
    }
}

/// Whether two inclusive date windows intersect
pub fn windows_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Plan the creation of a new subscription episode.
///
/// On success the returned plan's final insert is the new record; a
/// closure row for a stale ACTIVE group may precede it.
pub fn plan_create(
    records: &[SubscriptionRecord],
    today: NaiveDate,
    clinic_id: ClinicId,
    plan: &Plan,
    payment_method: &PaymentMethod,
    input: &CreateSubscription,
    actor: Option<ActorId>,
    config: &SubscriptionConfig,
) -> Result<TransitionPlan, SubscriptionError> {
    if derive_clinic_status(records, config.upcoming_clinic_policy) == ClinicStatus::Suspended {
        return Err(SubscriptionError::SuspendedClinic);
    }
    if !plan.is_active {
        return Err(SubscriptionError::InactivePlan);
    }
    if !payment_method.is_active {
        return Err(SubscriptionError::InactivePaymentMethod);
    }
    if input.amount_paid_cents < 0 {
        return Err(SubscriptionError::Validation(
            "amount_paid_cents must not be negative".to_string(),
        ));
    }
    if input.extra_accounts < 0 {
        return Err(SubscriptionError::Validation(
            "extra_accounts must not be negative".to_string(),
        ));
    }
    if plan.duration_days <= 0 {
        return Err(SubscriptionError::Validation(
            "plan duration must be positive".to_string(),
        ));
    }
    if input.start_date < today && !config.allow_past_start_date {
        return Err(SubscriptionError::Validation(
            "start_date cannot be in the past".to_string(),
        ));
    }

    let start_date = input.start_date;
    let end_date = start_date + Duration::days(i64::from(plan.duration_days));

    let heads = group_heads(records);
    for head in &heads {
        if !head.status.is_terminal()
            && windows_overlap(head.start_date, head.end_date, start_date, end_date)
        {
            return Err(SubscriptionError::OverlappingSubscription);
        }
    }

    let mut inserts = Vec::new();

    // A start today or earlier supersedes whatever is still marked
    // ACTIVE (necessarily stale: a live window would have overlapped).
    let status = if start_date <= today {
        if let Some(active) = heads.iter().find(|h| h.status == RecordStatus::Active) {
            inserts.push(closure_row(
                active,
                today,
                format!("Ended on {today}: superseded by a new subscription."),
            ));
        }
        RecordStatus::Active
    } else {
        RecordStatus::Upcoming
    };

    inserts.push(NewSubscriptionRecord {
        id: Uuid::new_v4(),
        group_id: Uuid::new_v4(),
        clinic_id: clinic_id.0,
        plan_id: plan.id.0,
        payment_method_id: payment_method.id.0,
        amount_paid_cents: input.amount_paid_cents,
        reference_number: input.reference_number.clone(),
        extra_accounts: input.extra_accounts,
        comments: input.comments.clone(),
        activated_by: actor.map(|a| a.0),
        activation_date: today,
        start_date,
        end_date,
        frozen_days_remaining: None,
        status: status.as_str().to_string(),
    });

    Ok(TransitionPlan {
        clinic_id: clinic_id.0,
        expected_max_seq: max_seq(records),
        inserts,
    })
}

/// Plan suspending an ACTIVE subscription.
///
/// Freezes the remaining coverage days into the SUSPENDED row so
/// reactivation restores the exact remaining duration.
pub fn plan_suspend(
    records: &[SubscriptionRecord],
    record_id: RecordId,
    today: NaiveDate,
    comment: &str,
    actor: Option<ActorId>,
) -> Result<TransitionPlan, SubscriptionError> {
    if comment.trim().is_empty() {
        return Err(SubscriptionError::Validation(
            "a comment is required to suspend a subscription".to_string(),
        ));
    }

    let head = require_head(records, record_id, "suspend")?;
    if head.status != RecordStatus::Active {
        return Err(SubscriptionError::InvalidStatusTransition {
            from: head.status,
            action: "suspend",
        });
    }

    // An upcoming plan must run its course or be refunded first.
    if group_heads(records)
        .iter()
        .any(|h| h.status == RecordStatus::Upcoming)
    {
        return Err(SubscriptionError::UpcomingBlocks);
    }

    let frozen = i32::try_from(head.days_left(today)).unwrap_or(i32::MAX);
    let mut row = successor(head, RecordStatus::Suspended, today, actor);
    row.start_date = today;
    row.end_date = head.end_date.max(today);
    row.frozen_days_remaining = Some(frozen);
    row.comments = format!("Suspended: {}", comment.trim());

    Ok(TransitionPlan {
        clinic_id: head.clinic_id.0,
        expected_max_seq: max_seq(records),
        inserts: vec![row],
    })
}

/// Plan reactivating a SUSPENDED subscription.
///
/// Restores the frozen day count measured from today. A suspend row
/// without a frozen count degrades to reusing its carried end date
/// rather than failing the operation.
pub fn plan_reactivate(
    records: &[SubscriptionRecord],
    record_id: RecordId,
    today: NaiveDate,
    comment: &str,
    actor: Option<ActorId>,
) -> Result<TransitionPlan, SubscriptionError> {
    if comment.trim().is_empty() {
        return Err(SubscriptionError::Validation(
            "a comment is required to reactivate a subscription".to_string(),
        ));
    }

    let head = require_head(records, record_id, "reactivate")?;
    if head.status != RecordStatus::Suspended {
        return Err(SubscriptionError::InvalidStatusTransition {
            from: head.status,
            action: "reactivate",
        });
    }

    let end_date = match head.frozen_days_remaining {
        Some(days) => today + Duration::days(i64::from(days.max(0))),
        None => {
            tracing::warn!(
                record_id = %head.id,
                "suspend record carries no frozen day count; falling back to its end date"
            );
            head.end_date.max(today)
        }
    };

    let mut row = successor(head, RecordStatus::Active, today, actor);
    row.start_date = today;
    row.end_date = end_date;
    row.comments = format!("Reactivated: {}", comment.trim());

    Ok(TransitionPlan {
        clinic_id: head.clinic_id.0,
        expected_max_seq: max_seq(records),
        inserts: vec![row],
    })
}

/// Plan refunding an ACTIVE, SUSPENDED, or UPCOMING subscription.
/// REFUNDED is terminal: the group accepts no further transitions.
pub fn plan_refund(
    records: &[SubscriptionRecord],
    record_id: RecordId,
    today: NaiveDate,
    comment: &str,
    actor: Option<ActorId>,
) -> Result<TransitionPlan, SubscriptionError> {
    let head = require_head(records, record_id, "refund")?;
    if head.status.is_terminal() {
        return Err(SubscriptionError::InvalidStatusTransition {
            from: head.status,
            action: "refund",
        });
    }

    let mut row = successor(head, RecordStatus::Refunded, today, actor);
    row.comments = if comment.trim().is_empty() {
        "Refunded.".to_string()
    } else {
        format!("Refunded: {}", comment.trim())
    };

    Ok(TransitionPlan {
        clinic_id: head.clinic_id.0,
        expected_max_seq: max_seq(records),
        inserts: vec![row],
    })
}

/// A planned reconciliation step for one clinic
#[derive(Debug)]
pub struct ReconcilePlan {
    /// Rows to append
    pub plan: TransitionPlan,
    /// UPCOMING heads becoming ACTIVE
    pub activated: u64,
    /// ACTIVE or lapsed UPCOMING heads becoming ENDED
    pub expired: u64,
}

/// Plan the time-triggered transitions for one clinic.
///
/// Activates the due UPCOMING head (ending any superseded ACTIVE group)
/// and expires overdue ACTIVE heads. Returns `None` when nothing is
/// due, which also makes repeated sweeps no-ops: once a group's head
/// has moved on it no longer matches.
pub fn plan_reconcile(records: &[SubscriptionRecord], today: NaiveDate) -> Option<ReconcilePlan> {
    let heads = group_heads(records);
    let mut inserts = Vec::new();
    let mut activated = 0u64;
    let mut expired = 0u64;
    let mut closed_groups: Vec<Uuid> = Vec::new();

    for head in &heads {
        if head.status != RecordStatus::Upcoming || head.start_date > today {
            continue;
        }
        if head.end_date < today {
            // The whole window passed before the plan ever served.
            inserts.push(closure_row(
                head,
                today,
                format!("Ended on {today}: coverage window lapsed before activation."),
            ));
            closed_groups.push(head.group_id.0);
            expired += 1;
            continue;
        }

        // End the active group this plan supersedes, if it has not been
        // closed already (double-processing guard).
        if let Some(active) = heads
            .iter()
            .find(|h| h.status == RecordStatus::Active && !closed_groups.contains(&h.group_id.0))
        {
            inserts.push(closure_row(
                active,
                today,
                format!("Ended on {today}: superseded by a due upcoming subscription."),
            ));
            closed_groups.push(active.group_id.0);
        }

        let mut row = successor(head, RecordStatus::Active, today, head.activated_by);
        row.comments = format!("Activated on {today}.");
        inserts.push(row);
        activated += 1;
    }

    for head in &heads {
        if head.status == RecordStatus::Active
            && head.end_date < today
            && !closed_groups.contains(&head.group_id.0)
        {
            inserts.push(closure_row(head, today, format!("Ended on {today}.")));
            closed_groups.push(head.group_id.0);
            expired += 1;
        }
    }

    if inserts.is_empty() {
        return None;
    }

    Some(ReconcilePlan {
        plan: TransitionPlan {
            clinic_id: records[0].clinic_id.0,
            expected_max_seq: max_seq(records),
            inserts,
        },
        activated,
        expired,
    })
}

/// Find the record and require that it is still the head of its group.
/// A superseded record reports the head's current status, which is what
/// the caller is actually transitioning against.
fn require_head<'a>(
    records: &'a [SubscriptionRecord],
    record_id: RecordId,
    action: &'static str,
) -> Result<&'a SubscriptionRecord, SubscriptionError> {
    let record = records
        .iter()
        .find(|r| r.id == record_id)
        .ok_or(SubscriptionError::RecordNotFound)?;

    let head = group_heads(records)
        .into_iter()
        .find(|h| h.group_id == record.group_id)
        .expect("record's group has a head");

    if head.id != record.id {
        return Err(SubscriptionError::InvalidStatusTransition {
            from: head.status,
            action,
        });
    }
    Ok(head)
}

/// Successor row template: same group, fields carried from the head
fn successor(
    head: &SubscriptionRecord,
    status: RecordStatus,
    today: NaiveDate,
    actor: Option<ActorId>,
) -> NewSubscriptionRecord {
    NewSubscriptionRecord {
        id: Uuid::new_v4(),
        group_id: head.group_id.0,
        clinic_id: head.clinic_id.0,
        plan_id: head.plan_id.0,
        payment_method_id: head.payment_method_id.0,
        amount_paid_cents: head.amount_paid_cents,
        reference_number: head.reference_number.clone(),
        extra_accounts: head.extra_accounts,
        comments: String::new(),
        activated_by: actor.map(|a| a.0),
        activation_date: today,
        start_date: head.start_date,
        end_date: head.end_date,
        frozen_days_remaining: None,
        status: status.as_str().to_string(),
    }
}

/// Terminal ENDED row closing a group
fn closure_row(head: &SubscriptionRecord, today: NaiveDate, comments: String) -> NewSubscriptionRecord {
    let mut row = successor(head, RecordStatus::Ended, today, head.activated_by);
    row.comments = comments;
    row
}
