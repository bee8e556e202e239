use crate::dto::account_dto::{
    DepositRequestDto, ReferralCountResponseDto, SupportRequestDto, UpdatePasswordRequestDto,
    UpdateProfileRequestDto, WithdrawalRequestDto,
};
use crate::service::account_service::{AccountService, AccountServiceImpl, NewDeposit, NewWithdrawal};
use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::jwt::Claims;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use axum::Extension;
use bson::oid::ObjectId;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

fn claims_user_id(claims: &Claims) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(&claims.sub).map_err(|_| HandlerError {
        error: HandlerErrorKind::Unauthorized,
        message: "Invalid token subject".to_string(),
    })
}

pub async fn dashboard_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, HandlerError> {
    let user_id = claims_user_id(&claims)?;
    let dashboard = service.dashboard(&user_id).await?;
    Ok(Json(dashboard))
}

pub async fn referral_count_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, HandlerError> {
    let user_id = claims_user_id(&claims)?;
    let referral_count = service.referral_count(&user_id).await?;
    Ok(Json(ReferralCountResponseDto { referral_count }))
}

pub async fn update_profile_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let user_id = claims_user_id(&claims)?;
    let profile = service
        .update_profile(&user_id, payload.full_name, payload.nationality)
        .await?;
    Ok(Json(profile))
}

pub async fn update_password_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdatePasswordRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let user_id = claims_user_id(&claims)?;
    let tokens = service
        .update_password(&user_id, payload.old_password, payload.new_password)
        .await?;
    Ok(Json(tokens))
}

pub async fn request_deposit_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DepositRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let user_id = claims_user_id(&claims)?;
    let request = NewDeposit {
        amount: payload.amount,
        coin: payload.coin,
        plan: payload.plan,
        daily_return: payload.daily_return,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };
    service.request_deposit(&user_id, request).await?;
    Ok(Json(json!({ "message": "Deposit request received" })))
}

pub async fn request_withdrawal_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<WithdrawalRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let user_id = claims_user_id(&claims)?;
    let request = NewWithdrawal {
        amount: payload.amount,
        coin: payload.coin,
        wallet_address: payload.wallet_address,
    };
    service.request_withdrawal(&user_id, request).await?;
    Ok(Json(json!({ "message": "Withdrawal request received" })))
}

pub async fn support_handler(
    State(service): State<Arc<AccountServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SupportRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let user_id = claims_user_id(&claims)?;
    service
        .send_support_request(&user_id, payload.subject, payload.message)
        .await?;
    Ok(Json(json!({ "message": "Support request sent" })))
}
