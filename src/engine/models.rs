//! Shared data types for query execution

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Neo4j,
    Postgresql,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Neo4j => "neo4j",
            DbType::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neo4j" => Ok(DbType::Neo4j),
            "postgresql" => Ok(DbType::Postgresql),
            other => Err(format!("Unknown database type: {}", other)),
        }
    }
}

/// Plaintext connection credentials.
///
/// Only ever held in memory between decryption and adapter construction.
/// `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCredentials {
    pub uri: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// A query plus its bound parameters (keys are `param_<name>`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Map::new(),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }
}

/// Rows returned by a backend, one JSON object per row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl QueryResult {
    /// Build a result, deriving `fields` from the first row's keys
    pub fn from_rows(data: Vec<Map<String, Value>>) -> Self {
        let fields = data.first().map(|row| row.keys().cloned().collect());
        Self { data, fields }
    }
}

/// Structural summary of a database, used for editor hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DatabaseSchema {
    #[default]
    Empty,
    Graph {
        labels: Vec<String>,
        relationship_types: Vec<String>,
        property_keys: Vec<String>,
    },
    Relational {
        tables: Vec<TableSchema>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_db_type_round_trip_names() {
        assert_eq!("neo4j".parse::<DbType>().unwrap(), DbType::Neo4j);
        assert_eq!("postgresql".parse::<DbType>().unwrap(), DbType::Postgresql);
        assert!("mysql".parse::<DbType>().is_err());
        assert_eq!(
            serde_json::to_value(DbType::Postgresql).unwrap(),
            json!("postgresql")
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = ConnectionCredentials {
            uri: "bolt://localhost:7687".into(),
            username: "neo4j".into(),
            password: "hunter2".into(),
            database: None,
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_credentials_database_optional() {
        let creds: ConnectionCredentials =
            serde_json::from_str(r#"{"uri":"u","username":"a","password":"b"}"#).unwrap();
        assert!(creds.database.is_none());
        let out = serde_json::to_value(&creds).unwrap();
        assert!(out.get("database").is_none());
    }

    #[test]
    fn test_query_result_fields_from_first_row() {
        let row = json!({"name": "Alice", "age": 30});
        let result = QueryResult::from_rows(vec![row.as_object().unwrap().clone()]);
        assert_eq!(
            result.fields,
            Some(vec!["name".to_string(), "age".to_string()])
        );

        let empty = QueryResult::from_rows(vec![]);
        assert!(empty.fields.is_none());
    }
}
