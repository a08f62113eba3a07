//! PostgreSQL clinic repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ClinicRow;
use crate::repo::{ClinicRepository, CreateClinic};

/// PostgreSQL clinic repository
#[derive(Clone)]
pub struct PgClinicRepository {
    pool: PgPool,
}

impl PgClinicRepository {
    /// Create a new clinic repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicRepository for PgClinicRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ClinicRow>> {
        let clinic = sqlx::query_as::<_, ClinicRow>(
            r#"
            SELECT id, name, owner_name, is_deactivated, created_at
            FROM clinics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(clinic)
    }

    async fn create(&self, clinic: CreateClinic) -> DbResult<ClinicRow> {
        let row = sqlx::query_as::<_, ClinicRow>(
            r#"
            INSERT INTO clinics (id, name, owner_name)
            VALUES ($1, $2, $3)
            RETURNING id, name, owner_name, is_deactivated, created_at
            "#,
        )
        .bind(clinic.id)
        .bind(&clinic.name)
        .bind(&clinic.owner_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> DbResult<()> {
        sqlx::query("UPDATE clinics SET is_deactivated = $1 WHERE id = $2")
            .bind(deactivated)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
