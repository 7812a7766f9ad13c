//! In-memory mock adapters for testing.
//!
//! `MockAdapterFactory` counts constructions and can be configured to delay or
//! fail them; every adapter it builds shares one `MockAdapterState`, so tests
//! can inspect the executed queries regardless of which handle ran them.

use super::models::{ConnectionCredentials, DatabaseSchema, DbType, QueryResult};
use super::traits::{AdapterFactory, QueryAdapter, QueryExecutionError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, inspectable state behind every mock adapter
#[derive(Default)]
pub struct MockAdapterState {
    pub executed: Mutex<Vec<(String, Map<String, Value>)>>,
    pub result: Mutex<QueryResult>,
    pub query_error: Mutex<Option<String>>,
    pub reachable: Mutex<bool>,
    pub schema: Mutex<DatabaseSchema>,
    pub schema_calls: AtomicUsize,
}

pub struct MockAdapter {
    state: Arc<MockAdapterState>,
}

#[async_trait]
impl QueryAdapter for MockAdapter {
    async fn run_query(
        &self,
        query: &str,
        params: &Map<String, Value>,
    ) -> Result<QueryResult, QueryExecutionError> {
        self.state
            .executed
            .lock()
            .unwrap()
            .push((query.to_string(), params.clone()));

        if let Some(message) = self.state.query_error.lock().unwrap().clone() {
            return Err(QueryExecutionError::new(message));
        }
        Ok(self.state.result.lock().unwrap().clone())
    }

    async fn test_connection(&self) -> Result<(), QueryExecutionError> {
        if *self.state.reachable.lock().unwrap() {
            Ok(())
        } else {
            Err(QueryExecutionError::new("Connection refused"))
        }
    }

    async fn fetch_schema(&self) -> Result<DatabaseSchema, QueryExecutionError> {
        self.state.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.schema.lock().unwrap().clone())
    }
}

pub struct MockAdapterFactory {
    pub state: Arc<MockAdapterState>,
    created: AtomicUsize,
    fail_remaining: AtomicUsize,
    create_delay: Duration,
}

impl MockAdapterFactory {
    pub fn new() -> Self {
        let state = MockAdapterState::default();
        *state.reachable.lock().unwrap() = true;
        Self {
            state: Arc::new(state),
            created: AtomicUsize::new(0),
            fail_remaining: AtomicUsize::new(0),
            create_delay: Duration::ZERO,
        }
    }

    pub fn with_create_delay_ms(mut self, ms: u64) -> Self {
        self.create_delay = Duration::from_millis(ms);
        self
    }

    /// Fail the next `n` constructions
    pub fn failing_creates(self, n: usize) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_result(self, result: QueryResult) -> Self {
        *self.state.result.lock().unwrap() = result;
        self
    }

    pub fn with_query_error(self, message: &str) -> Self {
        *self.state.query_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_schema(self, schema: DatabaseSchema) -> Self {
        *self.state.schema.lock().unwrap() = schema;
        self
    }

    pub fn unreachable(self) -> Self {
        *self.state.reachable.lock().unwrap() = false;
        self
    }

    /// Number of successfully constructed adapters
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<(String, Map<String, Value>)> {
        self.state.executed.lock().unwrap().clone()
    }
}

impl Default for MockAdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdapterFactory for MockAdapterFactory {
    async fn create(
        &self,
        _db_type: DbType,
        _credentials: &ConnectionCredentials,
    ) -> Result<Arc<dyn QueryAdapter>, QueryExecutionError> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(QueryExecutionError::new("could not connect to server"));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockAdapter {
            state: self.state.clone(),
        }))
    }
}
