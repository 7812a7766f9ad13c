//! HTTP API for the query engine

pub mod connection_handlers;
pub mod dashboard_handlers;
pub mod handlers;
pub mod params_handlers;
pub mod query_handlers;
pub mod routes;

pub use handlers::{AppError, ServerState, SharedState};
pub use routes::create_router;
