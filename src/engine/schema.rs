//! Schema lookup with a TTL cache and best-effort background warm-up

use super::executor::QueryExecutor;
use super::models::{ConnectionCredentials, DatabaseSchema, DbType};
use super::traits::QueryExecutionError;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

pub struct SchemaService {
    executor: Arc<QueryExecutor>,
    cache: Cache<String, Arc<DatabaseSchema>>,
}

impl SchemaService {
    pub fn new(executor: Arc<QueryExecutor>, ttl: Duration) -> Self {
        Self {
            executor,
            cache: Cache::builder().max_capacity(1_000).time_to_live(ttl).build(),
        }
    }

    /// Cached schema for a connection, fetched on miss
    pub async fn get(
        &self,
        connection_id: &str,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<Arc<DatabaseSchema>, QueryExecutionError> {
        self.cache
            .try_get_with(connection_id.to_string(), async {
                self.executor
                    .fetch_schema(db_type, credentials)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    pub async fn invalidate(&self, connection_id: &str) {
        self.cache.invalidate(connection_id).await;
    }

    /// Refresh the schema on a background task after a connection is saved.
    ///
    /// Not awaited by the caller; a failure is logged and discarded.
    pub fn spawn_warmup(
        self: &Arc<Self>,
        connection_id: String,
        db_type: DbType,
        credentials: ConnectionCredentials,
    ) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            service.invalidate(&connection_id).await;
            match service.get(&connection_id, db_type, &credentials).await {
                Ok(_) => tracing::debug!(%connection_id, "Schema prefetched"),
                Err(e) => tracing::warn!(%connection_id, error = %e, "Schema prefetch failed"),
            }
        })
    }
}
