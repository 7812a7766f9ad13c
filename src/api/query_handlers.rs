//! Query execution endpoint

use super::handlers::{AppError, SharedState};
use crate::auth::AuthUser;
use crate::engine::{compute_result_id, QueryRequest, QueryResult};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub connection_id: String,
    pub query: String,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

impl RunQueryRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.connection_id.is_empty() {
            return Err(AppError::BadRequest("connectionId must not be empty".into()));
        }
        if self.query.is_empty() {
            return Err(AppError::BadRequest("query must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    pub result_id: String,
}

/// POST /api/query
pub async fn run_query(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<RunQueryRequest>, JsonRejection>,
) -> Result<Json<RunQueryResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let connection = state
        .app
        .connections
        .get_owned(user.user_id, &req.connection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

    let params = req.params.map(Value::Object);
    let bound = params
        .as_ref()
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let request = QueryRequest::new(req.query.clone()).with_params(bound);

    let result = state
        .app
        .executor
        .execute_encrypted(
            &state.app.vault,
            connection.db_type,
            &connection.config_encrypted,
            &request,
        )
        .await?;

    let result_id = compute_result_id(&req.connection_id, &req.query, params.as_ref());
    tracing::debug!(
        connection_id = %req.connection_id,
        %result_id,
        rows = result.data.len(),
        "Query served"
    );

    Ok(Json(RunQueryResponse { result, result_id }))
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::engine::{DbType, QueryResult};
    use crate::test_helpers::{mock_state, seed_connection, TEST_USER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_query(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_query_success_returns_result_id() {
        let (state, factory) = mock_state();
        *factory.state.result.lock().unwrap() = QueryResult::from_rows(vec![json!({"n": 1})
            .as_object()
            .cloned()
            .unwrap()]);
        let conn_id = seed_connection(&state, TEST_USER, DbType::Neo4j).await;

        let (status, body) = post_query(
            create_router(state),
            json!({
                "connectionId": conn_id,
                "query": "MATCH (n {id: $param_id}) RETURN n",
                "params": {"param_id": 7}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([{"n": 1}]));
        assert_eq!(body["fields"], json!(["n"]));
        let result_id = body["resultId"].as_str().unwrap();
        assert_eq!(result_id.len(), 16);
        assert_eq!(
            result_id,
            crate::engine::compute_result_id(
                &conn_id,
                "MATCH (n {id: $param_id}) RETURN n",
                Some(&json!({"param_id": 7}))
            )
        );

        let executed = factory.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].1["param_id"], json!(7));
    }

    #[tokio::test]
    async fn test_query_without_params_hashes_null() {
        let (state, _factory) = mock_state();
        let conn_id = seed_connection(&state, TEST_USER, DbType::Postgresql).await;

        let (status, body) = post_query(
            create_router(state),
            json!({"connectionId": conn_id, "query": "SELECT 1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["resultId"],
            crate::engine::compute_result_id(&conn_id, "SELECT 1", None)
        );
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_invalid_body_returns_400() {
        let (state, _) = mock_state();
        let app = create_router(state);

        let (status, _) = post_query(app.clone(), json!({"query": "RETURN 1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            post_query(app.clone(), json!({"connectionId": "", "query": "RETURN 1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_query(app.clone(), json!({"connectionId": "c", "query": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_query(
            app,
            json!({"connectionId": "c", "query": "RETURN 1", "params": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_connection_returns_404() {
        let (state, _) = mock_state();
        let foreign = seed_connection(&state, uuid::Uuid::new_v4(), DbType::Neo4j).await;
        let app = create_router(state);

        let (status, _) =
            post_query(app.clone(), json!({"connectionId": "nope", "query": "RETURN 1"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            post_query(app, json!({"connectionId": foreign, "query": "RETURN 1"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_500_verbatim() {
        let (state, factory) = mock_state();
        *factory.state.query_error.lock().unwrap() =
            Some("ERROR: relation \"missing\" does not exist".to_string());
        let conn_id = seed_connection(&state, TEST_USER, DbType::Postgresql).await;

        let (status, body) = post_query(
            create_router(state),
            json!({"connectionId": conn_id, "query": "SELECT * FROM missing"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "ERROR: relation \"missing\" does not exist");
    }
}
