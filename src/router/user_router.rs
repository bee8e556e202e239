use crate::handler::user_handler::{
    dashboard_handler, referral_count_handler, request_deposit_handler,
    request_withdrawal_handler, support_handler, update_password_handler,
    update_profile_handler,
};
use crate::middlewares::user_middleware::{user_auth, UserAuthState};
use crate::service::account_service::AccountServiceImpl;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Investor routes, all behind the user access-token check.
pub fn user_router(service: Arc<AccountServiceImpl>, auth_state: Arc<UserAuthState>) -> Router {
    Router::new()
        .route("/api/user/dashboard", get(dashboard_handler))
        .route("/api/user/referrals", get(referral_count_handler))
        .route("/api/user/profile", put(update_profile_handler))
        .route("/api/user/password", put(update_password_handler))
        .route("/api/user/deposit", post(request_deposit_handler))
        .route("/api/user/withdrawal", post(request_withdrawal_handler))
        .route("/api/user/support", post(support_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, user_auth))
        .with_state(service)
}
