//! Auth middleware for Axum routes.
//!
//! Validates `Authorization: Bearer <jwt>` and injects `Claims` into the
//! request extensions. Without an auth config every request runs as the
//! anonymous user.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::jwt::Claims;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match state.auth.as_ref() {
        None => Claims::anonymous(),
        Some(auth) => {
            let token = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
                .strip_prefix("Bearer ")
                .ok_or_else(|| {
                    AppError::Unauthorized("Invalid Authorization header format".to_string())
                })?;

            let claims = auth
                .verify(token)
                .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

            if !auth.email_allowed(&claims.email) {
                return Err(AppError::Forbidden("Email domain not allowed".to_string()));
            }
            claims
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
