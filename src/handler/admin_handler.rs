use crate::dto::admin_dto::{
    AdminSignInRequestDto, BroadcastRequestDto, BroadcastResponseDto, JobReportResponseDto,
};
use crate::service::admin_service::{AdminService, AdminServiceImpl};
use crate::service::settlement_service::{BatchReport, SettlementService};
use crate::util::error::{HandlerError, HandlerErrorKind};
use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use bson::oid::ObjectId;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// Shared state for the admin realm.
pub struct AdminState {
    pub admin_service: Arc<AdminServiceImpl>,
    pub settlement: Arc<SettlementService>,
}

fn job_response(job: &str, report: BatchReport) -> JobReportResponseDto {
    JobReportResponseDto {
        job: job.to_string(),
        processed: report.processed,
        succeeded: report.succeeded,
        failed: report.failed,
        skipped: report.skipped,
    }
}

pub async fn admin_sign_in_handler(
    State(state): State<Arc<AdminState>>,
    Json(payload): Json<AdminSignInRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let tokens = state.admin_service.sign_in(payload.email, payload.password).await?;
    Ok(Json(tokens))
}

pub async fn list_users_handler(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let users = state.admin_service.list_users().await?;
    Ok(Json(users))
}

pub async fn delete_user_handler(
    State(state): State<Arc<AdminState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let user_id = ObjectId::parse_str(&user_id).map_err(|_| HandlerError {
        error: HandlerErrorKind::BadRequest,
        message: "Invalid user ID".to_string(),
    })?;
    state.admin_service.delete_user(&user_id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

pub async fn broadcast_handler(
    State(state): State<Arc<AdminState>>,
    Json(payload): Json<BroadcastRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let sent = state.admin_service.broadcast(payload.subject, payload.body).await?;
    Ok(Json(BroadcastResponseDto { sent }))
}

// Manual triggers for the scheduled jobs.

pub async fn settle_deposits_handler(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = state.settlement.settle_deposits().await?;
    Ok(Json(job_response("settle_deposits", report)))
}

pub async fn settle_withdrawals_handler(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = state.settlement.settle_withdrawals().await?;
    Ok(Json(job_response("settle_withdrawals", report)))
}

pub async fn accrue_profit_handler(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = state.settlement.accrue_profit().await?;
    Ok(Json(job_response("accrue_profit", report)))
}
