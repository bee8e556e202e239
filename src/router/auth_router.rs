use crate::handler::auth_handler::{
    forgot_password_handler, refresh_token_handler, reset_password_handler, sign_in_handler,
    sign_up_handler,
};
use crate::service::auth_service::AuthServiceImpl;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Public authentication routes.
pub fn auth_router(service: Arc<AuthServiceImpl>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(sign_up_handler))
        .route("/api/auth/signin", post(sign_in_handler))
        .route("/api/auth/refresh-token", post(refresh_token_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .with_state(service)
}
