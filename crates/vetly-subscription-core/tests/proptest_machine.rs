//! Property-based tests for the subscription state machine
//!
//! Verified properties:
//! - reconciliation converges: a second pass over the applied result
//!   plans nothing
//! - reconciliation never resurrects a terminal group and leaves at most
//!   one ACTIVE head
//! - create rejects exactly the windows that intersect a non-terminal
//!   head
//! - window intersection is symmetric

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use vetly_db::TransitionPlan;
use vetly_subscription_core::machine::{
    derive_clinic_status, group_heads, plan_create, plan_reconcile, windows_overlap,
};
use vetly_subscription_core::{CreateSubscription, SubscriptionConfig, UpcomingClinicPolicy};
use vetly_types::{
    ClinicId, ClinicStatus, GroupId, PaymentMethod, PaymentMethodId, Plan, PlanId, RecordId,
    RecordStatus, SubscriptionRecord,
};

const BASE: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

fn record(
    seq: i64,
    status: RecordStatus,
    start: NaiveDate,
    end: NaiveDate,
) -> SubscriptionRecord {
    SubscriptionRecord {
        id: RecordId(Uuid::new_v4()),
        seq,
        group_id: GroupId::new(),
        clinic_id: ClinicId(Uuid::nil()),
        plan_id: PlanId(Uuid::new_v4()),
        payment_method_id: PaymentMethodId(Uuid::new_v4()),
        amount_paid_cents: 10_000,
        reference_number: String::new(),
        extra_accounts: 0,
        comments: String::new(),
        activated_by: None,
        activation_date: start,
        start_date: start,
        end_date: end,
        frozen_days_remaining: None,
        status,
    }
}

/// Append a plan's rows to a snapshot the way the store would
fn apply_plan(records: &mut Vec<SubscriptionRecord>, plan: &TransitionPlan) {
    let max_seq = records.iter().map(|r| r.seq).max().unwrap_or(0);
    assert_eq!(
        max_seq, plan.expected_max_seq,
        "plan computed against a stale snapshot"
    );
    for (i, insert) in plan.inserts.iter().enumerate() {
        let mut row = record(
            max_seq + 1 + i as i64,
            insert.status.parse().unwrap(),
            insert.start_date,
            insert.end_date,
        );
        row.id = RecordId(insert.id);
        row.group_id = GroupId(insert.group_id);
        row.activation_date = insert.activation_date;
        row.frozen_days_remaining = insert.frozen_days_remaining;
        records.push(row);
    }
    records.sort_by_key(|r| (r.activation_date, r.seq));
}

fn arb_status() -> impl Strategy<Value = RecordStatus> {
    prop_oneof![
        Just(RecordStatus::Upcoming),
        Just(RecordStatus::Active),
        Just(RecordStatus::Ended),
        Just(RecordStatus::Suspended),
        Just(RecordStatus::Refunded),
    ]
}

/// A clinic snapshot respecting the store invariants: disjoint windows
/// per non-terminal group and at most one ACTIVE head. Each group is a
/// single record here; heads are what the machine inspects.
fn arb_snapshot() -> impl Strategy<Value = Vec<SubscriptionRecord>> {
    prop::collection::vec((arb_status(), 1i64..60, 1i64..90), 0..6).prop_map(|segments| {
        let mut records = Vec::new();
        let mut cursor = BASE();
        let mut seen_active = false;
        for (i, (status, gap, len)) in segments.into_iter().enumerate() {
            let status = if status == RecordStatus::Active {
                if seen_active {
                    RecordStatus::Ended
                } else {
                    seen_active = true;
                    RecordStatus::Active
                }
            } else {
                status
            };
            let start = cursor + Duration::days(gap);
            let end = start + Duration::days(len);
            cursor = end + Duration::days(1);
            records.push(record(i as i64 + 1, status, start, end));
        }
        records
    })
}

fn test_plan(duration_days: i32) -> Plan {
    Plan {
        id: PlanId(Uuid::new_v4()),
        name: "plan".to_string(),
        price_cents: 10_000,
        duration_days,
        allowed_accounts: 5,
        is_active: true,
    }
}

fn test_method() -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId(Uuid::new_v4()),
        name: "cash".to_string(),
        is_active: true,
    }
}

proptest! {
    /// Property: one reconciliation pass reaches a fixed point; a second
    /// pass with the same date plans nothing.
    #[test]
    fn prop_reconcile_converges(
        mut records in arb_snapshot(),
        today_offset in 0i64..400,
    ) {
        let today = BASE() + Duration::days(today_offset);
        if let Some(reconcile) = plan_reconcile(&records, today) {
            apply_plan(&mut records, &reconcile.plan);
            prop_assert!(plan_reconcile(&records, today).is_none());
        }
    }

    /// Property: reconciliation never appends to a terminal group and
    /// never leaves more than one ACTIVE head.
    #[test]
    fn prop_reconcile_preserves_invariants(
        mut records in arb_snapshot(),
        today_offset in 0i64..400,
    ) {
        let today = BASE() + Duration::days(today_offset);
        let terminal_groups: Vec<GroupId> = group_heads(&records)
            .into_iter()
            .filter(|h| h.status.is_terminal())
            .map(|h| h.group_id)
            .collect();

        if let Some(reconcile) = plan_reconcile(&records, today) {
            for insert in &reconcile.plan.inserts {
                prop_assert!(!terminal_groups.contains(&GroupId(insert.group_id)));
            }
            apply_plan(&mut records, &reconcile.plan);
        }

        let active_heads = group_heads(&records)
            .into_iter()
            .filter(|h| h.status == RecordStatus::Active)
            .count();
        prop_assert!(active_heads <= 1);
    }

    /// Property: after reconciliation, the derived status is Active
    /// exactly when an ACTIVE head exists.
    #[test]
    fn prop_derived_status_matches_heads(
        mut records in arb_snapshot(),
        today_offset in 0i64..400,
    ) {
        let today = BASE() + Duration::days(today_offset);
        if let Some(reconcile) = plan_reconcile(&records, today) {
            apply_plan(&mut records, &reconcile.plan);
        }
        let has_active = group_heads(&records)
            .iter()
            .any(|h| h.status == RecordStatus::Active);
        let status = derive_clinic_status(&records, UpcomingClinicPolicy::Ended);
        prop_assert_eq!(status == ClinicStatus::Active, has_active);
    }

    /// Property: create fails with an overlap error exactly when the
    /// requested window intersects a non-terminal head's window.
    #[test]
    fn prop_create_overlap_detection(
        records in arb_snapshot(),
        start_offset in 0i64..500,
        duration in 1i32..120,
    ) {
        // Derived-suspended clinics reject creation outright; overlap
        // detection is not reachable there.
        prop_assume!(
            derive_clinic_status(&records, UpcomingClinicPolicy::Ended)
                != ClinicStatus::Suspended
        );

        let today = BASE();
        let start = today + Duration::days(start_offset);
        let end = start + Duration::days(i64::from(duration));
        let plan = test_plan(duration);
        let method = test_method();
        let input = CreateSubscription {
            plan_id: plan.id,
            payment_method_id: method.id,
            amount_paid_cents: 10_000,
            start_date: start,
            reference_number: String::new(),
            comments: String::new(),
            extra_accounts: 0,
        };

        let expects_overlap = group_heads(&records).iter().any(|h| {
            !h.status.is_terminal()
                && windows_overlap(h.start_date, h.end_date, start, end)
        });

        let result = plan_create(
            &records,
            today,
            ClinicId(Uuid::nil()),
            &plan,
            &method,
            &input,
            None,
            &SubscriptionConfig::default(),
        );
        prop_assert_eq!(result.is_err(), expects_overlap);
    }

    /// Property: window intersection is symmetric
    #[test]
    fn prop_overlap_symmetric(
        a in 0i64..200, alen in 0i64..100,
        b in 0i64..200, blen in 0i64..100,
    ) {
        let base = BASE();
        let (a0, a1) = (base + Duration::days(a), base + Duration::days(a + alen));
        let (b0, b1) = (base + Duration::days(b), base + Duration::days(b + blen));
        prop_assert_eq!(
            windows_overlap(a0, a1, b0, b1),
            windows_overlap(b0, b1, a0, a1)
        );
    }
}
