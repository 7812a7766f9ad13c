//! Process-wide cache of backend adapter handles
//!
//! One handle per distinct `type|uri|username|database` key, kept for the
//! lifetime of the process. Each key owns a `OnceCell`, so concurrent first
//! use of the same key constructs exactly one handle. A failed construction
//! leaves the cell empty and the next caller retries.

use super::models::{ConnectionCredentials, DbType};
use super::traits::{AdapterFactory, QueryAdapter, QueryExecutionError};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

type AdapterCell = Arc<OnceCell<Arc<dyn QueryAdapter>>>;

/// Build the cache key for a connection
pub fn cache_key(db_type: DbType, credentials: &ConnectionCredentials) -> String {
    format!(
        "{}|{}|{}|{}",
        db_type,
        credentials.uri,
        credentials.username,
        credentials.database.as_deref().unwrap_or("")
    )
}

pub struct ConnectionAdapterCache {
    factory: Arc<dyn AdapterFactory>,
    adapters: DashMap<String, AdapterCell>,
}

impl ConnectionAdapterCache {
    pub fn new(factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            factory,
            adapters: DashMap::new(),
        }
    }

    /// Return the cached adapter for this connection, creating it on first use
    pub async fn get_or_create(
        &self,
        db_type: DbType,
        credentials: &ConnectionCredentials,
    ) -> Result<Arc<dyn QueryAdapter>, QueryExecutionError> {
        let key = cache_key(db_type, credentials);

        // Clone the cell out so the shard lock is not held across the await
        let cell: AdapterCell = self.adapters.entry(key).or_default().clone();

        let adapter = cell
            .get_or_try_init(|| async {
                tracing::info!(%db_type, uri = %credentials.uri, "Creating adapter");
                self.factory.create(db_type, credentials).await
            })
            .await?;

        Ok(adapter.clone())
    }

    /// Number of keys with a constructed adapter
    pub fn len(&self) -> usize {
        self.adapters
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
