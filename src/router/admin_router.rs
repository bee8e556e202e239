use crate::handler::admin_handler::{
    accrue_profit_handler, admin_sign_in_handler, broadcast_handler, delete_user_handler,
    list_users_handler, settle_deposits_handler, settle_withdrawals_handler, AdminState,
};
use crate::middlewares::admin_middleware::{admin_auth, AdminAuthState};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Admin realm: public sign-in plus protected management routes.
pub fn admin_router(state: Arc<AdminState>, auth_state: Arc<AdminAuthState>) -> Router {
    let public = Router::new().route("/api/admin/auth/signin", post(admin_sign_in_handler));

    let protected = Router::new()
        .route("/api/admin/users", get(list_users_handler))
        .route("/api/admin/users/:id", delete(delete_user_handler))
        .route("/api/admin/broadcast", post(broadcast_handler))
        .route("/api/admin/jobs/settle-deposits", post(settle_deposits_handler))
        .route("/api/admin/jobs/settle-withdrawals", post(settle_withdrawals_handler))
        .route("/api/admin/jobs/accrue-profit", post(accrue_profit_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, admin_auth));

    public.merge(protected).with_state(state)
}
