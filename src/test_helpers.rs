//! Test state builders backed by the mock adapter factory
#![allow(dead_code)]

use crate::api::{ServerState, SharedState};
use crate::auth::ANONYMOUS_USER_ID;
use crate::connections::{InMemoryConnectionStore, StoredConnection};
use crate::engine::mock::MockAdapterFactory;
use crate::engine::{ConnectionCredentials, CredentialVault, DbType, QueryExecutor};
use crate::params::MemorySnapshots;
use crate::{AppState, AuthConfig, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-chars!!";

/// Owner of connections in no-auth tests
pub const TEST_USER: Uuid = ANONYMOUS_USER_ID;

pub fn test_vault() -> CredentialVault {
    CredentialVault::new([7u8; 32])
}

pub fn test_config(auth_config: Option<AuthConfig>) -> Config {
    Config {
        server_port: 0,
        database_url: None,
        encryption_key: None,
        snapshot_dir: PathBuf::from("."),
        schema_cache_ttl: Duration::from_secs(60),
        auth_config,
    }
}

fn build_state(auth_config: Option<AuthConfig>) -> (SharedState, Arc<MockAdapterFactory>) {
    let factory = Arc::new(MockAdapterFactory::new());
    let app = AppState::from_parts(
        Arc::new(QueryExecutor::new(factory.clone())),
        test_vault(),
        Arc::new(InMemoryConnectionStore::new()),
        Arc::new(MemorySnapshots::new()),
        test_config(auth_config),
    );
    (ServerState::new(app), factory)
}

/// No-auth server state with in-memory stores and mock adapters
pub fn mock_state() -> (SharedState, Arc<MockAdapterFactory>) {
    build_state(None)
}

pub fn mock_state_with_auth(auth_config: AuthConfig) -> (SharedState, Arc<MockAdapterFactory>) {
    build_state(Some(auth_config))
}

pub fn test_credentials() -> ConnectionCredentials {
    ConnectionCredentials {
        uri: "bolt://localhost:7687".to_string(),
        username: "neo4j".to_string(),
        password: "password".to_string(),
        database: None,
    }
}

/// Store an encrypted connection for `user_id` and return its id
pub async fn seed_connection(state: &SharedState, user_id: Uuid, db_type: DbType) -> String {
    let encrypted = state.app.vault.encrypt(&test_credentials()).unwrap();
    let connection = StoredConnection::new(user_id, "Test connection", db_type, encrypted);
    state.app.connections.insert(&connection).await.unwrap();
    connection.id
}
