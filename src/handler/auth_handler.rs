use crate::dto::auth_dto::{
    ForgotPasswordRequestDto, RefreshTokenRequestDto, ResetPasswordRequestDto, SignInRequestDto,
    SignUpRequestDto,
};
use crate::service::auth_service::{AuthService, AuthServiceImpl, SignUpRequest};
use crate::util::error::HandlerError;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

pub async fn sign_up_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<SignUpRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let request = SignUpRequest {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        full_name: payload.full_name,
        nationality: payload.nationality,
        referred_by_code: payload.referral_code,
    };
    let response = service.sign_up(request).await?;
    Ok(Json(response))
}

pub async fn sign_in_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<SignInRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let response = service.sign_in(payload.email, payload.password).await?;
    Ok(Json(response))
}

pub async fn refresh_token_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<RefreshTokenRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let tokens = service.refresh_token(payload.refresh_token).await?;
    Ok(Json(tokens))
}

pub async fn forgot_password_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<ForgotPasswordRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    service.forgot_password(payload.email).await?;
    Ok(Json(json!({ "message": "Reset code sent" })))
}

pub async fn reset_password_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<ResetPasswordRequestDto>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    service.reset_password(payload.token, payload.new_password).await?;
    Ok(Json(json!({ "message": "Password reset" })))
}
