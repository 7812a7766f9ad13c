//! API route definitions

use super::handlers::{self, SharedState};
use super::{connection_handlers, dashboard_handlers, params_handlers, query_handlers};
use crate::auth::require_auth;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // Query execution
        .route("/api/query", post(query_handlers::run_query))
        // Connections
        .route(
            "/api/connections",
            post(connection_handlers::create_connection),
        )
        .route(
            "/api/connections/{id}",
            put(connection_handlers::update_connection),
        )
        .route(
            "/api/connections/{id}/test",
            post(connection_handlers::test_connection),
        )
        .route(
            "/api/connections/{id}/schema",
            get(connection_handlers::get_schema),
        )
        // Parameters
        .route("/api/params/resolve", post(params_handlers::resolve_params))
        .route(
            "/api/dashboards/{id}/parameters",
            get(params_handlers::get_parameter_snapshot)
                .put(params_handlers::save_parameter_snapshot),
        )
        // Layout inspection
        .route(
            "/api/layout/parameter-names",
            post(dashboard_handlers::parameter_names),
        )
        .route(
            "/api/layout/click",
            post(dashboard_handlers::resolve_widget_click),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
