//! Plan catalog handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vetly_db::{CreatePlan, PlanRepository};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{parse_uuid, validate_text, MAX_NAME_LEN};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub price_cents: i64,
    pub duration_days: i32,
    pub allowed_accounts: i32,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_days: i32,
    pub allowed_accounts: i32,
    pub is_active: bool,
}

impl From<vetly_types::Plan> for PlanResponse {
    fn from(plan: vetly_types::Plan) -> Self {
        Self {
            id: plan.id.to_string(),
            name: plan.name,
            price_cents: plan.price_cents,
            duration_days: plan.duration_days,
            allowed_accounts: plan.allowed_accounts,
            is_active: plan.is_active,
        }
    }
}

/// GET /api/v1/plans
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanResponse>>> {
    let plans = state.repos.plans.list().await?;
    Ok(Json(
        plans.into_iter().map(|p| p.into_plan().into()).collect(),
    ))
}

/// POST /api/v1/plans
pub async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<PlanResponse>)> {
    validate_text("name", &req.name, MAX_NAME_LEN)?;
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "price_cents must not be negative".to_string(),
        ));
    }
    if req.duration_days <= 0 {
        return Err(ApiError::BadRequest(
            "duration_days must be positive".to_string(),
        ));
    }
    if req.allowed_accounts < 0 {
        return Err(ApiError::BadRequest(
            "allowed_accounts must not be negative".to_string(),
        ));
    }

    let row = state
        .repos
        .plans
        .create(CreatePlan {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            price_cents: req.price_cents,
            duration_days: req.duration_days,
            allowed_accounts: req.allowed_accounts,
        })
        .await?;

    tracing::info!(plan_id = %row.id, "Plan created");
    Ok((StatusCode::CREATED, Json(row.into_plan().into())))
}

/// DELETE /api/v1/plans/{id}
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let plan_id = parse_uuid("plan id", &id)?;
    state
        .repos
        .plans
        .delete(plan_id)
        .await
        .map_err(|err| match err {
            vetly_db::DbError::InUse => ApiError::InUse("plan"),
            vetly_db::DbError::NotFound => ApiError::NotFound("plan"),
            other => other.into(),
        })?;

    tracing::info!(plan_id = %plan_id, "Plan deleted");
    Ok(StatusCode::NO_CONTENT)
}
