use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use axum::http::StatusCode;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

pub struct UserAuthState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

/// Requires a valid access token for the `user` realm. Claims are attached
/// to request extensions for handlers.
pub async fn user_auth(
    State(state): State<Arc<UserAuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = state
        .jwt_utils
        .extract_token_from_header(auth_header)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let claims = state
        .jwt_utils
        .validate_access_token(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    if !state.jwt_utils.check_role_permission(&claims.role, "user") {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
