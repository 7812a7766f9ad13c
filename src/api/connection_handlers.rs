//! Connection create/update, connectivity test and schema endpoints

use super::handlers::{AppError, SharedState};
use crate::auth::AuthUser;
use crate::connections::StoredConnection;
use crate::engine::{ConnectionCredentials, DatabaseSchema, DbType, EngineError};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateConnectionRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: DbType,
    pub config: ConnectionCredentials,
}

#[derive(Debug, Serialize)]
pub struct CreateConnectionResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConnectionRequest {
    pub config: ConnectionCredentials,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn validate_config(config: &ConnectionCredentials) -> Result<(), AppError> {
    if config.uri.is_empty() {
        return Err(AppError::BadRequest("config.uri must not be empty".into()));
    }
    if config.username.is_empty() {
        return Err(AppError::BadRequest("config.username must not be empty".into()));
    }
    Ok(())
}

/// Load an owned connection and decrypt its credentials
async fn load_credentials(
    state: &SharedState,
    user: &AuthUser,
    id: &str,
) -> Result<(StoredConnection, ConnectionCredentials), AppError> {
    let connection = state
        .app
        .connections
        .get_owned(user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

    let credentials = state
        .app
        .vault
        .decrypt::<ConnectionCredentials>(&connection.config_encrypted)
        .map_err(EngineError::from)?;

    Ok((connection, credentials))
}

/// POST /api/connections
pub async fn create_connection(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<CreateConnectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateConnectionResponse>), AppError> {
    let Json(req) = payload?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_config(&req.config)?;

    let encrypted = state.app.vault.encrypt(&req.config)?;
    let connection = StoredConnection::new(user.user_id, req.name.trim(), req.db_type, encrypted);
    state.app.connections.insert(&connection).await?;

    tracing::info!(
        connection_id = %connection.id,
        db_type = %connection.db_type,
        "Connection created"
    );
    state
        .app
        .schemas
        .spawn_warmup(connection.id.clone(), req.db_type, req.config);

    Ok((
        StatusCode::CREATED,
        Json(CreateConnectionResponse { id: connection.id }),
    ))
}

/// PUT /api/connections/{id}
pub async fn update_connection(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateConnectionRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = payload?;
    validate_config(&req.config)?;

    let connection = state
        .app
        .connections
        .get_owned(user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

    let encrypted = state.app.vault.encrypt(&req.config)?;
    if !state
        .app
        .connections
        .update_config(user.user_id, &id, &encrypted)
        .await?
    {
        return Err(AppError::NotFound("Connection not found".to_string()));
    }

    tracing::info!(connection_id = %id, "Connection updated");
    state
        .app
        .schemas
        .spawn_warmup(id, connection.db_type, req.config);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/connections/{id}/test
pub async fn test_connection(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TestConnectionResponse>, AppError> {
    let (connection, credentials) = load_credentials(&state, &user, &id).await?;

    let response = match state
        .app
        .executor
        .check_connection(connection.db_type, &credentials)
        .await
    {
        Ok(()) => TestConnectionResponse {
            success: true,
            error: None,
        },
        Err(e) => TestConnectionResponse {
            success: false,
            error: Some(e.to_string()),
        },
    };
    Ok(Json(response))
}

/// GET /api/connections/{id}/schema
pub async fn get_schema(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DatabaseSchema>, AppError> {
    let (connection, credentials) = load_credentials(&state, &user, &id).await?;
    let schema = state
        .app
        .schemas
        .get(&id, connection.db_type, &credentials)
        .await?;
    Ok(Json(DatabaseSchema::clone(&schema)))
}
