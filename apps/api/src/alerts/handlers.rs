use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

use super::dispatcher::{dispatch_job_alerts, JobPosting};
use super::subscribe::{subscribe, SubscribeOutcome, SubscribeRequest};
use super::verification::verify_code;

/// POST /api/v1/subscriptions
pub async fn handle_subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeOutcome>), AppError> {
    let outcome = subscribe(state.subscriptions.as_ref(), state.sms.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub user_id: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/subscriptions/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    verify_code(state.subscriptions.as_ref(), &req.user_id, &req.code).await?;
    Ok(Json(VerifyResponse {
        success: true,
        message: "Phone verified successfully. You will receive job alerts.".to_string(),
    }))
}

#[derive(Serialize)]
pub struct DispatchResponse {
    pub successes: usize,
    pub failures: usize,
    pub message: String,
}

/// POST /api/v1/alerts/dispatch
/// Called by the job-posting workflow after the job record is durably
/// persisted.
pub async fn handle_dispatch(
    State(state): State<AppState>,
    Json(job): Json<JobPosting>,
) -> Result<Json<DispatchResponse>, AppError> {
    let summary = dispatch_job_alerts(state.subscriptions.as_ref(), state.sms.as_ref(), &job).await?;
    Ok(Json(DispatchResponse {
        successes: summary.successes,
        failures: summary.failures,
        message: summary.human_readable(),
    }))
}
