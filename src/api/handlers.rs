//! Shared server state, health check and the API error type

use crate::auth::JwtAuth;
use crate::engine::{EngineError, EncryptionError, QueryExecutionError};
use crate::AppState;
use axum::{
    extract::rejection::JsonRejection, extract::State, http::StatusCode, response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub app: AppState,
    /// `None` runs every request as the anonymous user
    pub auth: Option<JwtAuth>,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(app: AppState) -> SharedState {
        let auth = app.config.auth_config.as_ref().map(JwtAuth::new);
        Arc::new(Self { app, auth })
    }
}

// ============================================================================
// Health check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_adapters: usize,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_adapters: state.app.executor.cache().len(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// Every body that fails to parse or match its schema is a 400
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Driver messages pass through untouched
impl From<QueryExecutionError> for AppError {
    fn from(err: QueryExecutionError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        if let EngineError::Decryption(e) = &err {
            tracing::error!(error = %e, "Stored connection config could not be decrypted");
        }
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}
