//! PostgreSQL subscription record repository implementation
//!
//! The record log is append-only. Writes go through [`apply`], which
//! serializes all writers for a clinic (manual transitions and the
//! reconciliation sweep alike) behind a per-clinic advisory transaction
//! lock and re-validates the snapshot the transition was planned from.
//!
//! [`apply`]: PgSubscriptionRepository::apply

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::{SubscriptionRepository, TransitionPlan};

const COLUMNS: &str = "id, seq, group_id, clinic_id, plan_id, payment_method_id, \
     amount_paid_cents, reference_number, extra_accounts, comments, activated_by, \
     activation_date, start_date, end_date, frozen_days_remaining, status";

/// PostgreSQL subscription record repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let record = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscription_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn history_for_clinic(&self, clinic_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let records = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM subscription_records
            WHERE clinic_id = $1
            ORDER BY activation_date, seq
            "#
        ))
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn clinics_due_for_reconciliation(&self, today: NaiveDate) -> DbResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT clinic_id FROM (
                SELECT DISTINCT ON (group_id)
                       clinic_id, status, start_date, end_date
                FROM subscription_records
                ORDER BY group_id, activation_date DESC, seq DESC
            ) heads
            WHERE (status = 'UPCOMING' AND start_date <= $1)
               OR (status = 'ACTIVE' AND end_date < $1)
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn active_heads_for_clinics(
        &self,
        clinic_ids: &[Uuid],
    ) -> DbResult<Vec<SubscriptionRow>> {
        let records = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM (
                SELECT DISTINCT ON (group_id) {COLUMNS}
                FROM subscription_records
                WHERE clinic_id = ANY($1)
                ORDER BY group_id, activation_date DESC, seq DESC
            ) heads
            WHERE status = 'ACTIVE'
            "#
        ))
        .bind(clinic_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn apply(&self, plan: TransitionPlan) -> DbResult<Vec<SubscriptionRow>> {
        let mut tx = self.pool.begin().await?;

        // Advisory lock instead of SELECT ... FOR UPDATE: it also covers
        // the clinic-has-no-rows case, where there is nothing to lock.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(plan.clinic_id)
            .execute(&mut *tx)
            .await?;

        let (max_seq,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(seq), 0) FROM subscription_records WHERE clinic_id = $1",
        )
        .bind(plan.clinic_id)
        .fetch_one(&mut *tx)
        .await?;

        // A row appended since the snapshot invalidates the plan; the
        // transaction rolls back on drop.
        if max_seq != plan.expected_max_seq {
            return Err(DbError::Conflict);
        }

        let mut inserted = Vec::with_capacity(plan.inserts.len());
        for record in &plan.inserts {
            let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
                r#"
                INSERT INTO subscription_records
                    (id, group_id, clinic_id, plan_id, payment_method_id,
                     amount_paid_cents, reference_number, extra_accounts, comments,
                     activated_by, activation_date, start_date, end_date,
                     frozen_days_remaining, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING {COLUMNS}
                "#
            ))
            .bind(record.id)
            .bind(record.group_id)
            .bind(record.clinic_id)
            .bind(record.plan_id)
            .bind(record.payment_method_id)
            .bind(record.amount_paid_cents)
            .bind(&record.reference_number)
            .bind(record.extra_accounts)
            .bind(&record.comments)
            .bind(record.activated_by)
            .bind(record.activation_date)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(record.frozen_days_remaining)
            .bind(&record.status)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
