//! Parameter resolution and per-dashboard parameter snapshots

use super::handlers::{AppError, SharedState};
use crate::auth::AuthUser;
use crate::params::{
    extract_referenced_params, get_missing_param_names, ParameterEntry, ParameterStore,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct ResolveParamsRequest {
    pub query: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ResolveParamsResponse {
    /// Referenced values keyed `param_<name>`, ready to send with the query
    pub referenced: Map<String, Value>,
    pub missing: Vec<String>,
    pub ready: bool,
}

/// POST /api/params/resolve
pub async fn resolve_params(
    payload: Result<Json<ResolveParamsRequest>, JsonRejection>,
) -> Result<Json<ResolveParamsResponse>, AppError> {
    let Json(req) = payload?;
    let missing = get_missing_param_names(&req.query, &req.params);
    Ok(Json(ResolveParamsResponse {
        referenced: extract_referenced_params(&req.query, &req.params),
        ready: missing.is_empty(),
        missing,
    }))
}

/// Snapshots are scoped to their owner
fn snapshot_key(user: &AuthUser, dashboard_id: &str) -> String {
    format!("{}:{}", user.user_id, dashboard_id)
}

/// GET /api/dashboards/{id}/parameters
pub async fn get_parameter_snapshot(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(dashboard_id): Path<String>,
) -> Result<Json<HashMap<String, ParameterEntry>>, AppError> {
    let mut store = ParameterStore::new(state.app.snapshots.clone());
    store
        .restore_from_dashboard(&snapshot_key(&user, &dashboard_id))
        .await;
    Ok(Json(store.entries().clone()))
}

/// PUT /api/dashboards/{id}/parameters
pub async fn save_parameter_snapshot(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(dashboard_id): Path<String>,
    payload: Result<Json<HashMap<String, ParameterEntry>>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(entries) = payload?;

    let mut store = ParameterStore::new(state.app.snapshots.clone());
    for (name, entry) in entries {
        store.insert_entry(&name, entry);
    }
    store
        .save_to_dashboard(&snapshot_key(&user, &dashboard_id))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
