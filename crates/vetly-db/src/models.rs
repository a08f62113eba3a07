//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::DbError;

/// Clinic row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ClinicRow {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub is_deactivated: bool,
    pub created_at: DateTime<Utc>,
}

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub duration_days: i32,
    pub allowed_accounts: i32,
    pub is_active: bool,
}

/// Payment method row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethodRow {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Subscription record row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub seq: i64,
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

// Conversion implementations from row types to vetly-types domain types

impl ClinicRow {
    /// Convert to the domain clinic type
    pub fn into_clinic(self) -> vetly_types::Clinic {
        vetly_types::Clinic {
            id: vetly_types::ClinicId(self.id),
            name: self.name,
            owner_name: self.owner_name,
            is_deactivated: self.is_deactivated,
            created_at: self.created_at,
        }
    }
}

impl PlanRow {
    /// Convert to the domain plan type
    pub fn into_plan(self) -> vetly_types::Plan {
        vetly_types::Plan {
            id: vetly_types::PlanId(self.id),
            name: self.name,
            price_cents: self.price_cents,
            duration_days: self.duration_days,
            allowed_accounts: self.allowed_accounts,
            is_active: self.is_active,
        }
    }
}

impl PaymentMethodRow {
    /// Convert to the domain payment method type
    pub fn into_payment_method(self) -> vetly_types::PaymentMethod {
        vetly_types::PaymentMethod {
            id: vetly_types::PaymentMethodId(self.id),
            name: self.name,
            is_active: self.is_active,
        }
    }
}

impl TryFrom<SubscriptionRow> for vetly_types::SubscriptionRecord {
    type Error = DbError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| DbError::Corrupt(format!("record {}: status {}", row.id, row.status)))?;

        Ok(Self {
            id: vetly_types::RecordId(row.id),
            seq: row.seq,
            group_id: vetly_types::GroupId(row.group_id),
            clinic_id: vetly_types::ClinicId(row.clinic_id),
            plan_id: vetly_types::PlanId(row.plan_id),
            payment_method_id: vetly_types::PaymentMethodId(row.payment_method_id),
            amount_paid_cents: row.amount_paid_cents,
            reference_number: row.reference_number,
            extra_accounts: row.extra_accounts,
            comments: row.comments,
            activated_by: row.activated_by.map(vetly_types::ActorId),
            activation_date: row.activation_date,
            start_date: row.start_date,
            end_date: row.end_date,
            frozen_days_remaining: row.frozen_days_remaining,
            status,
        })
    }
}
