//! Neo4j adapter (Bolt protocol via neo4rs)

use super::models::{ConnectionCredentials, DatabaseSchema, QueryResult};
use super::traits::{QueryAdapter, QueryExecutionError};
use async_trait::async_trait;
use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString,
    BoltType, ConfigBuilder, Graph, Query,
};
use serde_json::{Map, Value};

/// Adapter holding a pooled neo4rs graph handle
pub struct Neo4jAdapter {
    graph: Graph,
}

impl Neo4jAdapter {
    /// Build a graph handle with native (basic) auth
    pub async fn connect(credentials: &ConnectionCredentials) -> Result<Self, QueryExecutionError> {
        let mut builder = ConfigBuilder::default()
            .uri(credentials.uri.as_str())
            .user(credentials.username.as_str())
            .password(credentials.password.as_str())
            .fetch_size(500)
            .max_connections(10);
        if let Some(ref database) = credentials.database {
            builder = builder.db(database.as_str());
        }
        let config = builder.build()?;
        let graph = Graph::connect(config).await?;

        tracing::debug!(uri = %credentials.uri, "Neo4j graph handle created");
        Ok(Self { graph })
    }

    /// Execute a parameterized Cypher query and collect all rows
    async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>, QueryExecutionError> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn collect_names(&self, cypher: &str, column: &str) -> Result<Vec<String>, QueryExecutionError> {
        let rows = self.execute_with_params(query(cypher)).await?;
        let mut names: Vec<String> = match rows.first() {
            Some(row) => row
                .get(column)
                .map_err(|e| QueryExecutionError::new(e.to_string()))?,
            None => Vec::new(),
        };
        names.sort();
        Ok(names)
    }
}

/// Build a Cypher query with `param_*` keys bound as native parameters
pub(crate) fn build_query(cypher: &str, params: &Map<String, Value>) -> Query {
    params
        .iter()
        .fold(query(cypher), |q, (key, value)| q.param(key, json_to_bolt(value)))
}

/// Convert a JSON value to its Bolt equivalent
pub(crate) fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => BoltType::String(BoltString::from(s.as_str())),
        Value::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => BoltType::Map(BoltMap::from_iter(
            map.iter()
                .map(|(k, v)| (BoltString::from(k.as_str()), json_to_bolt(v))),
        )),
    }
}

#[async_trait]
impl QueryAdapter for Neo4jAdapter {
    async fn run_query(
        &self,
        cypher: &str,
        params: &Map<String, Value>,
    ) -> Result<QueryResult, QueryExecutionError> {
        let rows = self.execute_with_params(build_query(cypher, params)).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let record: Map<String, Value> = row
                .to()
                .map_err(|e| QueryExecutionError::new(e.to_string()))?;
            data.push(record);
        }
        Ok(QueryResult::from_rows(data))
    }

    async fn test_connection(&self) -> Result<(), QueryExecutionError> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn fetch_schema(&self) -> Result<DatabaseSchema, QueryExecutionError> {
        let labels = self
            .collect_names(
                "CALL db.labels() YIELD label RETURN collect(label) AS names",
                "names",
            )
            .await?;
        let relationship_types = self
            .collect_names(
                "CALL db.relationshipTypes() YIELD relationshipType RETURN collect(relationshipType) AS names",
                "names",
            )
            .await?;
        let property_keys = self
            .collect_names(
                "CALL db.propertyKeys() YIELD propertyKey RETURN collect(propertyKey) AS names",
                "names",
            )
            .await?;

        Ok(DatabaseSchema::Graph {
            labels,
            relationship_types,
            property_keys,
        })
    }
}
