//! In-memory mock repositories
//!
//! The subscription mock reproduces the store's append-only contract:
//! `apply` is atomic, assigns monotonically increasing seqs, and rejects
//! a plan whose snapshot is stale. A conflict-injection knob lets tests
//! exercise the engine's re-plan loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use uuid::Uuid;

use vetly_db::{
    ClinicRepository, ClinicRow, CreateClinic, CreatePaymentMethod, CreatePlan, DbError, DbResult,
    PaymentMethodRepository, PaymentMethodRow, PlanRepository, PlanRow, SubscriptionRepository,
    SubscriptionRow, TransitionPlan,
};

/// In-memory clinic repository
#[derive(Default, Clone)]
pub struct MockClinicRepository {
    clinics: Arc<DashMap<Uuid, ClinicRow>>,
}

impl MockClinicRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, clinic: ClinicRow) {
        self.clinics.insert(clinic.id, clinic);
    }
}

#[async_trait]
impl ClinicRepository for MockClinicRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ClinicRow>> {
        Ok(self.clinics.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, clinic: CreateClinic) -> DbResult<ClinicRow> {
        let row = ClinicRow {
            id: clinic.id,
            name: clinic.name,
            owner_name: clinic.owner_name,
            is_deactivated: false,
            created_at: chrono::Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> DbResult<()> {
        match self.clinics.get_mut(&id) {
            Some(mut clinic) => {
                clinic.is_deactivated = deactivated;
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }
}

/// In-memory plan repository.
///
/// Holds a handle to the record store so deletion honors the same
/// referenced-row guard as the real repository.
#[derive(Clone)]
pub struct MockPlanRepository {
    plans: Arc<DashMap<Uuid, PlanRow>>,
    subscriptions: Arc<MockSubscriptionRepository>,
}

impl MockPlanRepository {
    pub fn new(subscriptions: Arc<MockSubscriptionRepository>) -> Self {
        Self {
            plans: Arc::new(DashMap::new()),
            subscriptions,
        }
    }

    pub fn insert(&self, plan: PlanRow) {
        self.plans.insert(plan.id, plan);
    }

    #[allow(dead_code)]
    pub fn set_active(&self, id: Uuid, active: bool) {
        if let Some(mut plan) = self.plans.get_mut(&id) {
            plan.is_active = active;
        }
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        Ok(self.plans.iter().map(|r| r.value().clone()).collect())
    }

    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow> {
        let row = PlanRow {
            id: plan.id,
            name: plan.name,
            price_cents: plan.price_cents,
            duration_days: plan.duration_days,
            allowed_accounts: plan.allowed_accounts,
            is_active: true,
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if self.subscriptions.references_plan(id) {
            return Err(DbError::InUse);
        }
        self.plans.remove(&id).map(|_| ()).ok_or(DbError::NotFound)
    }
}

/// In-memory payment method repository with the referenced-row guard
#[derive(Clone)]
pub struct MockPaymentMethodRepository {
    methods: Arc<DashMap<Uuid, PaymentMethodRow>>,
    subscriptions: Arc<MockSubscriptionRepository>,
}

impl MockPaymentMethodRepository {
    pub fn new(subscriptions: Arc<MockSubscriptionRepository>) -> Self {
        Self {
            methods: Arc::new(DashMap::new()),
            subscriptions,
        }
    }

    pub fn insert(&self, method: PaymentMethodRow) {
        self.methods.insert(method.id, method);
    }

    #[allow(dead_code)]
    pub fn set_active(&self, id: Uuid, active: bool) {
        if let Some(mut method) = self.methods.get_mut(&id) {
            method.is_active = active;
        }
    }
}

#[async_trait]
impl PaymentMethodRepository for MockPaymentMethodRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentMethodRow>> {
        Ok(self.methods.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> DbResult<Vec<PaymentMethodRow>> {
        Ok(self.methods.iter().map(|r| r.value().clone()).collect())
    }

    async fn create(&self, method: CreatePaymentMethod) -> DbResult<PaymentMethodRow> {
        let row = PaymentMethodRow {
            id: method.id,
            name: method.name,
            is_active: true,
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if self.subscriptions.references_payment_method(id) {
            return Err(DbError::InUse);
        }
        self.methods
            .remove(&id)
            .map(|_| ())
            .ok_or(DbError::NotFound)
    }
}

#[derive(Default)]
struct SubscriptionStore {
    rows: Vec<SubscriptionRow>,
    next_seq: i64,
}

/// In-memory append-only subscription record store
#[derive(Default)]
pub struct MockSubscriptionRepository {
    store: Mutex<SubscriptionStore>,
    inject_conflicts: AtomicU32,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` apply calls fail with [`DbError::Conflict`]
    #[allow(dead_code)]
    pub fn inject_conflicts(&self, n: u32) {
        self.inject_conflicts.store(n, Ordering::SeqCst);
    }

    /// All rows, in insertion order
    pub fn all_rows(&self) -> Vec<SubscriptionRow> {
        self.store.lock().unwrap().rows.clone()
    }

    /// Whether any record references the plan
    pub fn references_plan(&self, plan_id: Uuid) -> bool {
        self.store
            .lock()
            .unwrap()
            .rows
            .iter()
            .any(|r| r.plan_id == plan_id)
    }

    /// Whether any record references the payment method
    pub fn references_payment_method(&self, method_id: Uuid) -> bool {
        self.store
            .lock()
            .unwrap()
            .rows
            .iter()
            .any(|r| r.payment_method_id == method_id)
    }

    fn heads(rows: &[SubscriptionRow]) -> Vec<SubscriptionRow> {
        let mut sorted: Vec<_> = rows.to_vec();
        sorted.sort_by_key(|r| (r.activation_date, r.seq));
        let mut by_group: std::collections::HashMap<Uuid, SubscriptionRow> =
            std::collections::HashMap::new();
        for row in sorted {
            by_group.insert(row.group_id, row);
        }
        by_group.into_values().collect()
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn history_for_clinic(&self, clinic_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let mut rows: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|r| r.clinic_id == clinic_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.activation_date, r.seq));
        Ok(rows)
    }

    async fn clinics_due_for_reconciliation(&self, today: NaiveDate) -> DbResult<Vec<Uuid>> {
        let rows = self.all_rows();
        let mut due: Vec<Uuid> = Self::heads(&rows)
            .into_iter()
            .filter(|h| {
                (h.status == "UPCOMING" && h.start_date <= today)
                    || (h.status == "ACTIVE" && h.end_date < today)
            })
            .map(|h| h.clinic_id)
            .collect();
        due.sort();
        due.dedup();
        Ok(due)
    }

    async fn active_heads_for_clinics(
        &self,
        clinic_ids: &[Uuid],
    ) -> DbResult<Vec<SubscriptionRow>> {
        let rows = self.all_rows();
        Ok(Self::heads(&rows)
            .into_iter()
            .filter(|h| h.status == "ACTIVE" && clinic_ids.contains(&h.clinic_id))
            .collect())
    }

    async fn apply(&self, plan: TransitionPlan) -> DbResult<Vec<SubscriptionRow>> {
        if self
            .inject_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DbError::Conflict);
        }

        let mut store = self.store.lock().unwrap();
        let max_seq = store
            .rows
            .iter()
            .filter(|r| r.clinic_id == plan.clinic_id)
            .map(|r| r.seq)
            .max()
            .unwrap_or(0);
        if max_seq != plan.expected_max_seq {
            return Err(DbError::Conflict);
        }

        let mut inserted = Vec::with_capacity(plan.inserts.len());
        for insert in plan.inserts {
            store.next_seq += 1;
            let row = SubscriptionRow {
                id: insert.id,
                seq: store.next_seq,
                group_id: insert.group_id,
                clinic_id: insert.clinic_id,
                plan_id: insert.plan_id,
                payment_method_id: insert.payment_method_id,
                amount_paid_cents: insert.amount_paid_cents,
                reference_number: insert.reference_number,
                extra_accounts: insert.extra_accounts,
                comments: insert.comments,
                activated_by: insert.activated_by,
                activation_date: insert.activation_date,
                start_date: insert.start_date,
                end_date: insert.end_date,
                frozen_days_remaining: insert.frozen_days_remaining,
                status: insert.status,
            };
            store.rows.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }
}
