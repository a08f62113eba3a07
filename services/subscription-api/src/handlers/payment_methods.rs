//! Payment method catalog handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vetly_db::{CreatePaymentMethod, PaymentMethodRepository};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{parse_uuid, validate_text, MAX_NAME_LEN};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

impl From<vetly_types::PaymentMethod> for PaymentMethodResponse {
    fn from(method: vetly_types::PaymentMethod) -> Self {
        Self {
            id: method.id.to_string(),
            name: method.name,
            is_active: method.is_active,
        }
    }
}

/// GET /api/v1/payment-methods
pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentMethodResponse>>> {
    let methods = state.repos.payment_methods.list().await?;
    Ok(Json(
        methods
            .into_iter()
            .map(|m| m.into_payment_method().into())
            .collect(),
    ))
}

/// POST /api/v1/payment-methods
pub async fn create_payment_method(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentMethodRequest>,
) -> ApiResult<(StatusCode, Json<PaymentMethodResponse>)> {
    validate_text("name", &req.name, MAX_NAME_LEN)?;

    let row = state
        .repos
        .payment_methods
        .create(CreatePaymentMethod {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
        })
        .await?;

    tracing::info!(payment_method_id = %row.id, "Payment method created");
    Ok((StatusCode::CREATED, Json(row.into_payment_method().into())))
}

/// DELETE /api/v1/payment-methods/{id}
pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let method_id = parse_uuid("payment method id", &id)?;
    state
        .repos
        .payment_methods
        .delete(method_id)
        .await
        .map_err(|err| match err {
            vetly_db::DbError::InUse => ApiError::InUse("payment method"),
            vetly_db::DbError::NotFound => ApiError::NotFound("payment method"),
            other => other.into(),
        })?;

    tracing::info!(payment_method_id = %method_id, "Payment method deleted");
    Ok(StatusCode::NO_CONTENT)
}
