//! Adapter contract shared by the Neo4j and PostgreSQL backends
//!
//! Every backend exposes the same three operations so the executor never
//! needs to know which driver it is talking to. Construction goes through an
//! [`AdapterFactory`], which lets tests inject in-memory adapters.

use super::models::{ConnectionCredentials, DatabaseSchema, DbType, QueryResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Backend driver failure.
///
/// `Display` is the backend's message verbatim so callers can surface
/// driver-specific diagnostics unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryExecutionError {
    pub message: String,
}

impl QueryExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<neo4rs::Error> for QueryExecutionError {
    fn from(err: neo4rs::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<sqlx::Error> for QueryExecutionError {
    fn from(err: sqlx::Error) -> Self {
        // Surface the server's own message for database errors
        match err {
            sqlx::Error::Database(db) => Self::new(db.message()),
            other => Self::new(other.to_string()),
        }
    }
}

/// Uniform query-execution contract implemented by each backend
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    /// Run `query` with `params` (keys are `param_<name>`)
    async fn run_query(
        &self,
        query: &str,
        params: &Map<String, Value>,
    ) -> Result<QueryResult, QueryExecutionError>;

    /// Lightweight connectivity check
    async fn test_connection(&self) -> Result<(), QueryExecutionError>;

    /// Describe labels/tables available on the connection
    async fn fetch_schema(&self) -> Result<DatabaseSchema, QueryExecutionError>;
}

/// Builds a backend adapter for a (type, credentials) pair
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn create(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<Arc<dyn QueryAdapter>, QueryExecutionError>;
}

/// Production factory: neo4rs for Neo4j, a sqlx pool for PostgreSQL
#[derive(Debug, Default, Clone)]
pub struct DriverAdapterFactory;

#[async_trait]
impl AdapterFactory for DriverAdapterFactory {
    async fn create(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<Arc<dyn QueryAdapter>, QueryExecutionError> {
        match db_type {
            DbType::Neo4j => Ok(Arc::new(
                super::neo4j::Neo4jAdapter::connect(credentials).await?,
            )),
            DbType::Postgresql => Ok(Arc::new(
                super::postgres::PostgresAdapter::connect(credentials)?,
            )),
        }
    }
}
