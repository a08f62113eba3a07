//! Shared handler utilities
//!
//! Common validation, ID parsing, and response shapes used across
//! handlers. Centralizing these keeps input limits and wire formats
//! consistent.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use vetly_types::SubscriptionRecord;

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for comments and free-text audit fields
pub const MAX_COMMENT_LEN: usize = 1000;

/// Maximum length for payment reference numbers
pub const MAX_REFERENCE_LEN: usize = 128;

/// Maximum length for names (clinics, plans, payment methods)
pub const MAX_NAME_LEN: usize = 256;

/// Validate a required, length-bounded text field
pub fn validate_text(field: &'static str, value: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} cannot be empty")));
    }
    if value.len() > max_len {
        return Err(ApiError::BadRequest(format!(
            "{field} too long (max {max_len} chars)"
        )));
    }
    Ok(())
}

/// Validate an optional, length-bounded text field
pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ApiError> {
    if let Some(value) = value {
        if value.len() > max_len {
            return Err(ApiError::BadRequest(format!(
                "{field} too long (max {max_len} chars)"
            )));
        }
    }
    Ok(())
}

/// Parse a UUID field, naming the field in the error
pub fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

// ============================================================================
// Response Types
// ============================================================================

/// One subscription record on the wire
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: String,
    pub group_id: String,
    pub clinic_id: String,
    pub plan_id: String,
    pub payment_method_id: String,
    pub amount_paid_cents: i64,
    pub reference_number: String,
    pub extra_accounts: i32,
    pub comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_by: Option<String>,
    pub activation_date: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_days_remaining: Option<i32>,
    pub status: String,
    pub days_left: i64,
}

impl RecordResponse {
    /// Build the wire shape, deriving `days_left` as of `today`
    pub fn from_record(record: &SubscriptionRecord, today: NaiveDate) -> Self {
        Self {
            id: record.id.to_string(),
            group_id: record.group_id.to_string(),
            clinic_id: record.clinic_id.to_string(),
            plan_id: record.plan_id.to_string(),
            payment_method_id: record.payment_method_id.to_string(),
            amount_paid_cents: record.amount_paid_cents,
            reference_number: record.reference_number.clone(),
            extra_accounts: record.extra_accounts,
            comments: record.comments.clone(),
            activated_by: record.activated_by.map(|a| a.to_string()),
            activation_date: record.activation_date.to_string(),
            start_date: record.start_date.to_string(),
            end_date: record.end_date.to_string(),
            frozen_days_remaining: record.frozen_days_remaining,
            status: record.status.as_str().to_string(),
            days_left: record.days_left(today),
        }
    }
}
