//! Uniform query execution over the Neo4j and PostgreSQL adapters

use super::cache::ConnectionAdapterCache;
use super::models::{ConnectionCredentials, DatabaseSchema, DbType, QueryRequest, QueryResult};
use super::traits::{AdapterFactory, QueryExecutionError};
use super::vault::{CredentialVault, DecryptionError};
use std::sync::Arc;

/// Errors surfaced by the executor to request handlers
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    #[error(transparent)]
    Query(#[from] QueryExecutionError),
}

/// Executes queries through cached adapters.
///
/// No retries and no timeout: a failed or hung backend call is reported
/// to (or blocks) the caller as-is.
pub struct QueryExecutor {
    cache: ConnectionAdapterCache,
}

impl QueryExecutor {
    pub fn new(factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            cache: ConnectionAdapterCache::new(factory),
        }
    }

    pub fn cache(&self) -> &ConnectionAdapterCache {
        &self.cache
    }

    /// Run a query; backend failures carry the driver message verbatim
    pub async fn execute(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
        request: &QueryRequest,
    ) -> Result<QueryResult, QueryExecutionError> {
        let adapter = self.cache.get_or_create(db_type, credentials).await?;

        let start = std::time::Instant::now();
        let result = adapter.run_query(&request.query, &request.params).await;
        match &result {
            Ok(r) => tracing::debug!(
                %db_type,
                rows = r.data.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query executed"
            ),
            Err(e) => tracing::warn!(%db_type, error = %e, "Query failed"),
        }
        result
    }

    /// Decrypt a stored config blob and run the query
    pub async fn execute_encrypted(
        &self,
        vault: &CredentialVault,
        db_type: DbType,
        config_encrypted: &str,
        request: &QueryRequest,
    ) -> Result<QueryResult, EngineError> {
        let credentials: ConnectionCredentials = vault.decrypt(config_encrypted)?;
        Ok(self.execute(db_type, &credentials, request).await?)
    }

    /// Connectivity check with the backend's error preserved
    pub async fn check_connection(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<(), QueryExecutionError> {
        let adapter = self.cache.get_or_create(db_type, credentials).await?;
        adapter.test_connection().await
    }

    /// Connectivity check reduced to a boolean
    pub async fn test_connection(&self, db_type: DbType, credentials: &ConnectionCredentials) -> bool {
        match self.check_connection(db_type, credentials).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%db_type, error = %e, "Connection test failed");
                false
            }
        }
    }

    pub async fn fetch_schema(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<DatabaseSchema, QueryExecutionError> {
        let adapter = self.cache.get_or_create(db_type, credentials).await?;
        adapter.fetch_schema().await
    }
}
