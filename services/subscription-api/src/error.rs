//! Error types for the Subscription API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vetly_db::DbError;
use vetly_subscription_core::SubscriptionError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Clinic is suspended; reactivate it before purchasing a new plan")]
    SuspendedClinic,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0} is still referenced by subscription records")]
    InUse(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SuspendedClinic => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::InUse(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::SuspendedClinic => "CLINIC_SUSPENDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InUse(_) => "IN_USE",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::Validation(msg) => Self::BadRequest(msg),
            SubscriptionError::OverlappingSubscription
            | SubscriptionError::InvalidStatusTransition { .. }
            | SubscriptionError::UpcomingBlocks
            | SubscriptionError::InactivePlan
            | SubscriptionError::InactivePaymentMethod => Self::BadRequest(err.to_string()),
            SubscriptionError::SuspendedClinic => Self::SuspendedClinic,
            SubscriptionError::ClinicNotFound => Self::NotFound("clinic"),
            SubscriptionError::RecordNotFound => Self::NotFound("subscription record"),
            SubscriptionError::PlanNotFound => Self::NotFound("plan"),
            SubscriptionError::PaymentMethodNotFound => Self::NotFound("payment method"),
            SubscriptionError::Conflict => Self::Conflict(err.to_string()),
            SubscriptionError::Database(db) => db.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound("resource"),
            DbError::InUse => Self::InUse("resource"),
            DbError::Conflict => Self::Conflict("concurrent modification; please retry".to_string()),
            other => Self::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if matches!(self, Self::Internal(_) | Self::Database(_)) {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
