//! Reconciliation handlers

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use vetly_subscription_core::ReconciliationReport;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReconciliationResponse {
    pub date: String,
    pub clinics_due: u64,
    pub clinics_changed: u64,
    pub activated: u64,
    pub expired: u64,
    pub failed: u64,
}

impl From<ReconciliationReport> for ReconciliationResponse {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            date: report.date.to_string(),
            clinics_due: report.clinics_due,
            clinics_changed: report.clinics_changed,
            activated: report.activated,
            expired: report.expired,
            failed: report.failed,
        }
    }
}

/// POST /api/v1/reconciliation/run
///
/// Manual trigger for the sweep the background scheduler runs on its
/// interval. Safe to call repeatedly; the sweep is idempotent.
pub async fn run_reconciliation(
    State(state): State<AppState>,
) -> ApiResult<Json<ReconciliationResponse>> {
    let start = Instant::now();
    let report = state.subscriptions.run_daily_reconciliation().await?;
    record_reconciliation_metrics(&report, start.elapsed().as_secs_f64());
    Ok(Json(report.into()))
}

/// Shared between the manual trigger and the background scheduler
pub fn record_reconciliation_metrics(report: &ReconciliationReport, elapsed_secs: f64) {
    metrics::counter!("reconciliation_runs_total").increment(1);
    metrics::counter!("reconciliation_records_total", "kind" => "activated")
        .increment(report.activated);
    metrics::counter!("reconciliation_records_total", "kind" => "expired")
        .increment(report.expired);
    metrics::counter!("reconciliation_clinics_failed_total").increment(report.failed);
    metrics::histogram!("reconciliation_duration_seconds").record(elapsed_secs);
}
