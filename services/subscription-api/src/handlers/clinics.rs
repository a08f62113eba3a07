//! Clinic handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vetly_db::{ClinicRepository, CreateClinic};
use vetly_types::ClinicId;

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{parse_uuid, validate_text, MAX_NAME_LEN};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub owner_name: String,
}

#[derive(Debug, Serialize)]
pub struct ClinicResponse {
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub is_deactivated: bool,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ClinicStatusResponse {
    pub clinic_id: String,
    pub status: String,
    /// Remaining coverage days of the active subscription, 0 otherwise
    pub days_left: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/clinics
pub async fn create_clinic(
    State(state): State<AppState>,
    Json(req): Json<CreateClinicRequest>,
) -> ApiResult<(StatusCode, Json<ClinicResponse>)> {
    validate_text("name", &req.name, MAX_NAME_LEN)?;
    validate_text("owner_name", &req.owner_name, MAX_NAME_LEN)?;

    let row = state
        .repos
        .clinics
        .create(CreateClinic {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            owner_name: req.owner_name.trim().to_string(),
        })
        .await?;
    let clinic = row.into_clinic();

    tracing::info!(clinic_id = %clinic.id, "Clinic registered");

    Ok((
        StatusCode::CREATED,
        Json(ClinicResponse {
            id: clinic.id.to_string(),
            name: clinic.name,
            owner_name: clinic.owner_name,
            is_deactivated: clinic.is_deactivated,
            status: "inactive".to_string(),
            created_at: clinic.created_at.to_rfc3339(),
        }),
    ))
}

/// GET /api/v1/clinics/{id}
pub async fn get_clinic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClinicResponse>> {
    let clinic_id = ClinicId(parse_uuid("clinic id", &id)?);

    let clinic = state
        .repos
        .clinics
        .find_by_id(clinic_id.0)
        .await?
        .ok_or(ApiError::NotFound("clinic"))?
        .into_clinic();
    let status = state.subscriptions.clinic_status(clinic_id).await?;

    Ok(Json(ClinicResponse {
        id: clinic.id.to_string(),
        name: clinic.name,
        owner_name: clinic.owner_name,
        is_deactivated: clinic.is_deactivated,
        status: status.to_string(),
        created_at: clinic.created_at.to_rfc3339(),
    }))
}

/// GET /api/v1/clinics/{id}/status
pub async fn get_clinic_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClinicStatusResponse>> {
    let clinic_id = ClinicId(parse_uuid("clinic id", &id)?);
    let status = state.subscriptions.clinic_status(clinic_id).await?;
    let days_left = state
        .subscriptions
        .active_records_for_clinics(&[clinic_id])
        .await?
        .first()
        .map_or(0, |record| record.days_left(state.subscriptions.today()));

    Ok(Json(ClinicStatusResponse {
        clinic_id: clinic_id.to_string(),
        status: status.to_string(),
        days_left,
    }))
}
