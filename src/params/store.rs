//! In-memory parameter bindings with per-dashboard snapshots

use super::models::{ParameterEntry, ParameterSource, ParameterType};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistence for serialized parameter snapshots, keyed by dashboard id
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    async fn load(&self, dashboard_id: &str) -> Result<Option<String>, SnapshotError>;

    async fn save(&self, dashboard_id: &str, json: &str) -> Result<(), SnapshotError>;
}

#[derive(Default)]
pub struct MemorySnapshots {
    snapshots: DashMap<String, String>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshots {
    async fn load(&self, dashboard_id: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.snapshots.get(dashboard_id).map(|s| s.value().clone()))
    }

    async fn save(&self, dashboard_id: &str, json: &str) -> Result<(), SnapshotError> {
        self.snapshots
            .insert(dashboard_id.to_string(), json.to_string());
        Ok(())
    }
}

/// One `<id>.json` file per dashboard under a directory
pub struct FileSnapshots {
    dir: PathBuf,
}

impl FileSnapshots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Safe file name for a dashboard id.
    ///
    /// Ids that needed escaping get a digest suffix so `a/b` and `a_b` stay distinct.
    pub fn file_name(dashboard_id: &str) -> String {
        let sanitized: String = dashboard_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized == dashboard_id && !sanitized.is_empty() {
            format!("{}.json", sanitized)
        } else {
            let digest = hex::encode(Sha256::digest(dashboard_id.as_bytes()));
            format!("{}-{}.json", sanitized, &digest[..8])
        }
    }

    fn path_for(&self, dashboard_id: &str) -> PathBuf {
        self.dir.join(Self::file_name(dashboard_id))
    }
}

#[async_trait]
impl SnapshotBackend for FileSnapshots {
    async fn load(&self, dashboard_id: &str) -> Result<Option<String>, SnapshotError> {
        match tokio::fs::read_to_string(self.path_for(dashboard_id)).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, dashboard_id: &str, json: &str) -> Result<(), SnapshotError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(dashboard_id), json).await?;
        Ok(())
    }
}

/// Canonical map of active parameter bindings.
///
/// Companion entries (`_from`/`_to`, `_min`/`_max`) are ordinary keys: the
/// store never sets or clears them on behalf of their parent.
pub struct ParameterStore {
    entries: HashMap<String, ParameterEntry>,
    snapshots: Arc<dyn SnapshotBackend>,
}

impl ParameterStore {
    pub fn new(snapshots: Arc<dyn SnapshotBackend>) -> Self {
        Self {
            entries: HashMap::new(),
            snapshots,
        }
    }

    /// Store with in-memory snapshots only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySnapshots::new()))
    }

    /// Upsert with the default `text` type and `click-action` provenance
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: Value,
        source: &str,
        field: &str,
    ) {
        self.set_parameter_with(
            name,
            value,
            source,
            field,
            ParameterType::default(),
            ParameterSource::default(),
        );
    }

    pub fn set_parameter_with(
        &mut self,
        name: &str,
        value: Value,
        source: &str,
        field: &str,
        param_type: ParameterType,
        source_type: ParameterSource,
    ) {
        self.entries.insert(
            name.to_string(),
            ParameterEntry {
                value,
                source: source.to_string(),
                field: field.to_string(),
                param_type,
                source_type,
            },
        );
    }

    pub fn insert_entry(&mut self, name: &str, entry: ParameterEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    pub fn clear_parameter(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<&ParameterEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> &HashMap<String, ParameterEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name to raw value, provenance dropped
    pub fn values(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect()
    }

    /// Persist a snapshot for `dashboard_id`; nothing is written while the store is empty
    pub async fn save_to_dashboard(&self, dashboard_id: &str) -> Result<(), SnapshotError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_string(&self.entries)?;
        self.snapshots.save(dashboard_id, &json).await?;
        tracing::debug!(%dashboard_id, count = self.entries.len(), "Parameters saved");
        Ok(())
    }

    /// Replace the current bindings with the snapshot for `dashboard_id`.
    ///
    /// A missing, unreadable or corrupt snapshot leaves the store empty.
    pub async fn restore_from_dashboard(&mut self, dashboard_id: &str) {
        let restored = match self.snapshots.load(dashboard_id).await {
            Ok(Some(json)) => match serde_json::from_str::<HashMap<String, ParameterEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(%dashboard_id, error = %e, "Discarding corrupt parameter snapshot");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!(%dashboard_id, error = %e, "Failed to load parameter snapshot");
                HashMap::new()
            }
        };
        self.entries = restored;
    }
}
