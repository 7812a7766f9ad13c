//! Stored connection rows

use crate::engine::DbType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved database connection; credentials stay encrypted at rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConnection {
    pub id: String,
    pub user_id: Uuid,
    pub name: String,
    pub db_type: DbType,
    /// `iv:tag:cipher` blob produced by the credential vault
    pub config_encrypted: String,
}

impl StoredConnection {
    pub fn new(user_id: Uuid, name: &str, db_type: DbType, config_encrypted: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name: name.to_string(),
            db_type,
            config_encrypted,
        }
    }
}
