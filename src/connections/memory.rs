use super::models::StoredConnection;
use super::traits::ConnectionStore;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Process-local connection store, used when no database URL is configured
#[derive(Default)]
pub struct InMemoryConnectionStore {
    connections: DashMap<String, StoredConnection>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn get_owned(&self, user_id: Uuid, id: &str) -> Result<Option<StoredConnection>> {
        Ok(self
            .connections
            .get(id)
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone()))
    }

    async fn insert(&self, connection: &StoredConnection) -> Result<()> {
        self.connections
            .insert(connection.id.clone(), connection.clone());
        Ok(())
    }

    async fn update_config(
        &self,
        user_id: Uuid,
        id: &str,
        config_encrypted: &str,
    ) -> Result<bool> {
        match self.connections.get_mut(id) {
            Some(mut c) if c.user_id == user_id => {
                c.config_encrypted = config_encrypted.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
