use super::models::StoredConnection;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for saved connections, scoped by owner
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// The connection with `id` if it exists and belongs to `user_id`
    async fn get_owned(&self, user_id: Uuid, id: &str) -> Result<Option<StoredConnection>>;

    async fn insert(&self, connection: &StoredConnection) -> Result<()>;

    /// Replace the encrypted config; `false` when no owned connection matched
    async fn update_config(&self, user_id: Uuid, id: &str, config_encrypted: &str)
        -> Result<bool>;
}
