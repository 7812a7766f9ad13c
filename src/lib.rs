//! Dashboard Engine
//!
//! Query execution and parameter resolution for Neo4j / PostgreSQL dashboards:
//! - Encrypted connection credentials and a per-connection adapter cache
//! - Uniform query execution over both backends, with result fingerprints
//! - Parameter store, `$param_` resolution and relative date presets
//! - Click-action resolution and parameter discovery over dashboard layouts
//! - HTTP API with bearer-token auth

pub mod api;
pub mod auth;
pub mod connections;
pub mod dashboard;
pub mod engine;
pub mod params;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use connections::{ConnectionStore, InMemoryConnectionStore, PgConnectionStore};
use engine::{CredentialVault, DriverAdapterFactory, QueryExecutor, SchemaService};
use params::{FileSnapshots, SnapshotBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub database: DatabaseYamlConfig,
    pub security: SecurityYamlConfig,
    pub params: ParamsYamlConfig,
    pub schema: SchemaYamlConfig,
    /// Auth section; absent means every request runs as the anonymous user
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Where saved connections live; no URL means an in-memory store
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseYamlConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYamlConfig {
    /// 64 hex characters (AES-256 key)
    pub encryption_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ParamsYamlConfig {
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaYamlConfig {
    pub cache_ttl_secs: u64,
}

impl Default for SchemaYamlConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Optional domain restriction (e.g. "example.com")
    pub allowed_email_domain: Option<String>,
}

fn default_jwt_expiry() -> u64 {
    28800 // 8 hours
}

fn default_snapshot_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dashboard-engine")
        .join("snapshots")
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub encryption_key: Option<String>,
    pub snapshot_dir: PathBuf,
    pub schema_cache_ttl: Duration,
    pub auth_config: Option<AuthConfig>,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default. If `yaml_path` is None, tries
    /// "config.yaml" in CWD.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let auth_config = match (yaml.auth, std::env::var("JWT_SECRET").ok()) {
            (Some(mut auth), Some(secret)) => {
                auth.jwt_secret = secret;
                Some(auth)
            }
            (Some(auth), None) => Some(auth),
            (None, Some(secret)) => Some(AuthConfig {
                jwt_secret: secret,
                jwt_expiry_secs: default_jwt_expiry(),
                allowed_email_domain: None,
            }),
            (None, None) => None,
        };

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            database_url: std::env::var("DATABASE_URL").ok().or(yaml.database.url),
            encryption_key: std::env::var("ENCRYPTION_KEY")
                .ok()
                .or(yaml.security.encryption_key),
            snapshot_dir: std::env::var("PARAM_SNAPSHOT_DIR")
                .ok()
                .map(PathBuf::from)
                .or(yaml.params.snapshot_dir)
                .unwrap_or_else(default_snapshot_dir),
            schema_cache_ttl: Duration::from_secs(
                std::env::var("SCHEMA_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(yaml.schema.cache_ttl_secs),
            ),
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// The credential vault for this config; the key is mandatory
    pub fn vault(&self) -> Result<CredentialVault> {
        let key = self
            .encryption_key
            .as_deref()
            .context("ENCRYPTION_KEY (or security.encryption_key) is required")?;
        CredentialVault::from_hex(key)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    pub vault: Arc<CredentialVault>,
    pub connections: Arc<dyn ConnectionStore>,
    pub schemas: Arc<SchemaService>,
    pub snapshots: Arc<dyn SnapshotBackend>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state with the real database drivers
    pub async fn new(config: Config) -> Result<Self> {
        let vault = config.vault()?;

        let connections: Arc<dyn ConnectionStore> = match &config.database_url {
            Some(url) => {
                let store = PgConnectionStore::connect(url).await?;
                store.ensure_schema().await?;
                tracing::info!("Using PostgreSQL connection store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, connections are kept in memory only");
                Arc::new(InMemoryConnectionStore::new())
            }
        };

        let executor = Arc::new(QueryExecutor::new(Arc::new(DriverAdapterFactory)));
        let snapshots = Arc::new(FileSnapshots::new(config.snapshot_dir.clone()));

        Ok(Self::from_parts(
            executor,
            vault,
            connections,
            snapshots,
            config,
        ))
    }

    pub fn from_parts(
        executor: Arc<QueryExecutor>,
        vault: CredentialVault,
        connections: Arc<dyn ConnectionStore>,
        snapshots: Arc<dyn SnapshotBackend>,
        config: Config,
    ) -> Self {
        let schemas = Arc::new(SchemaService::new(
            executor.clone(),
            config.schema_cache_ttl,
        ));
        Self {
            executor,
            vault: Arc::new(vault),
            connections,
            schemas,
            snapshots,
            config: Arc::new(config),
        }
    }
}

/// Build state and serve the HTTP API until the process is stopped
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let app = AppState::new(config).await?;
    let router = api::create_router(api::ServerState::new(app));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Dashboard engine listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
