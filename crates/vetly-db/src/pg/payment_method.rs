//! PostgreSQL payment method repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::PaymentMethodRow;
use crate::repo::{CreatePaymentMethod, PaymentMethodRepository};

/// PostgreSQL payment method repository
#[derive(Clone)]
pub struct PgPaymentMethodRepository {
    pool: PgPool,
}

impl PgPaymentMethodRepository {
    /// Create a new payment method repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodRepository for PgPaymentMethodRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentMethodRow>> {
        let method = sqlx::query_as::<_, PaymentMethodRow>(
            "SELECT id, name, is_active FROM payment_methods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    async fn list(&self) -> DbResult<Vec<PaymentMethodRow>> {
        let methods = sqlx::query_as::<_, PaymentMethodRow>(
            "SELECT id, name, is_active FROM payment_methods ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    async fn create(&self, method: CreatePaymentMethod) -> DbResult<PaymentMethodRow> {
        let row = sqlx::query_as::<_, PaymentMethodRow>(
            r#"
            INSERT INTO payment_methods (id, name)
            VALUES ($1, $2)
            RETURNING id, name, is_active
            "#,
        )
        .bind(method.id)
        .bind(&method.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let (references,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscription_records WHERE payment_method_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if references > 0 {
            return Err(DbError::InUse);
        }

        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
