//! Layout inspection endpoints: parameter names and click resolution

use super::handlers::AppError;
use crate::dashboard::{collect_parameter_names, resolve_click, ClickEffect, Dashboard, Widget};
use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct ParameterNamesResponse {
    pub names: Vec<String>,
}

/// POST /api/layout/parameter-names
pub async fn parameter_names(
    payload: Result<Json<Dashboard>, JsonRejection>,
) -> Result<Json<ParameterNamesResponse>, AppError> {
    let Json(dashboard) = payload?;
    Ok(Json(ParameterNamesResponse {
        names: collect_parameter_names(&dashboard),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub widget: Widget,
    pub point: Map<String, Value>,
}

/// POST /api/layout/click; `null` when the click has no effect
pub async fn resolve_widget_click(
    payload: Result<Json<ClickRequest>, JsonRejection>,
) -> Result<Json<Option<ClickEffect>>, AppError> {
    let Json(req) = payload?;
    Ok(Json(resolve_click(&req.widget, &req.point)))
}
