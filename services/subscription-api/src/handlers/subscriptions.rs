//! Subscription lifecycle handlers

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use vetly_subscription_core::CreateSubscription;
use vetly_types::{ActorId, ClinicId, PaymentMethodId, PlanId, RecordId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{
    parse_uuid, validate_optional_text, RecordResponse, MAX_COMMENT_LEN, MAX_REFERENCE_LEN,
};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_id: String,
    pub payment_method_id: String,
    pub amount_paid_cents: i64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub extra_accounts: Option<i32>,
    #[serde(default)]
    pub activated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub activated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRecordsQuery {
    /// Comma-separated clinic IDs
    pub clinic_ids: String,
}

fn parse_actor(activated_by: Option<&str>) -> Result<Option<ActorId>, ApiError> {
    activated_by
        .map(|s| parse_uuid("activated_by", s).map(ActorId))
        .transpose()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/clinics/{id}/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<RecordResponse>)> {
    let start = Instant::now();

    let clinic_id = ClinicId(parse_uuid("clinic id", &id)?);
    let plan_id = PlanId(parse_uuid("plan_id", &req.plan_id)?);
    let payment_method_id = PaymentMethodId(parse_uuid("payment_method_id", &req.payment_method_id)?);
    let actor = parse_actor(req.activated_by.as_deref())?;
    validate_optional_text("reference_number", req.reference_number.as_deref(), MAX_REFERENCE_LEN)?;
    validate_optional_text("comments", req.comments.as_deref(), MAX_COMMENT_LEN)?;

    let record = state
        .subscriptions
        .create_subscription(
            clinic_id,
            CreateSubscription {
                plan_id,
                payment_method_id,
                amount_paid_cents: req.amount_paid_cents,
                start_date: req.start_date,
                reference_number: req.reference_number.unwrap_or_default(),
                comments: req.comments.unwrap_or_default(),
                extra_accounts: req.extra_accounts.unwrap_or(0),
            },
            actor,
        )
        .await?;

    metrics::counter!("subscription_transitions_total", "action" => "create").increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "create")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(
        clinic_id = %clinic_id,
        record_id = %record.id,
        status = %record.status,
        "Subscription created"
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse::from_record(&record, state.subscriptions.today())),
    ))
}

/// GET /api/v1/clinics/{id}/subscriptions
pub async fn list_clinic_subscriptions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<RecordResponse>>> {
    let clinic_id = ClinicId(parse_uuid("clinic id", &id)?);
    let history = state.subscriptions.clinic_history(clinic_id).await?;

    let now = state.subscriptions.today();
    Ok(Json(
        history
            .iter()
            .map(|r| RecordResponse::from_record(r, now))
            .collect(),
    ))
}

/// POST /api/v1/subscriptions/{id}/suspend
pub async fn suspend_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<RecordResponse>> {
    transition(&state, &id, req, "suspend").await
}

/// POST /api/v1/subscriptions/{id}/reactivate
pub async fn reactivate_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<RecordResponse>> {
    transition(&state, &id, req, "reactivate").await
}

/// POST /api/v1/subscriptions/{id}/refund
pub async fn refund_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<RecordResponse>> {
    transition(&state, &id, req, "refund").await
}

/// GET /api/v1/subscriptions/active?clinic_ids=a,b,c
///
/// Batch lookup of the currently serving record per clinic, for callers
/// gating many clinics in one pass.
pub async fn active_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ActiveRecordsQuery>,
) -> ApiResult<Json<Vec<RecordResponse>>> {
    let clinic_ids = query
        .clinic_ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_uuid("clinic_ids", s.trim()).map(ClinicId))
        .collect::<Result<Vec<_>, _>>()?;

    let records = state
        .subscriptions
        .active_records_for_clinics(&clinic_ids)
        .await?;

    let now = state.subscriptions.today();
    Ok(Json(
        records
            .iter()
            .map(|r| RecordResponse::from_record(r, now))
            .collect(),
    ))
}

async fn transition(
    state: &AppState,
    id: &str,
    req: TransitionRequest,
    action: &'static str,
) -> ApiResult<Json<RecordResponse>> {
    let start = Instant::now();

    let record_id = RecordId(parse_uuid("record id", id)?);
    let actor = parse_actor(req.activated_by.as_deref())?;
    validate_optional_text("comment", req.comment.as_deref(), MAX_COMMENT_LEN)?;
    let comment = req.comment.unwrap_or_default();

    let record = match action {
        "suspend" => state.subscriptions.suspend(record_id, &comment, actor).await?,
        "reactivate" => {
            state
                .subscriptions
                .reactivate(record_id, &comment, actor)
                .await?
        }
        _ => state.subscriptions.refund(record_id, &comment, actor).await?,
    };

    metrics::counter!("subscription_transitions_total", "action" => action).increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => action)
        .record(start.elapsed().as_secs_f64());

    tracing::info!(record_id = %record.id, status = %record.status, action, "Subscription transition applied");

    Ok(Json(RecordResponse::from_record(
        &record,
        state.subscriptions.today(),
    )))
}
