//! Mock storage client for testing.
//!
//! Serves a canned result for every statement and records what it was asked
//! to run, so tests can assert that rejected statements never reach storage.

use super::{Column, DatabaseClient, QueryResult, Value};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock storage client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    tables: Vec<(String, Vec<Column>)>,
    result: QueryResult,
    executed: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockDatabaseClient {
    /// Creates a mock with no tables and an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table with the given columns.
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<Column>) -> Self {
        self.tables.push((name.into(), columns));
        self
    }

    /// Sets the result returned for every statement.
    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.result = result;
        self
    }

    /// Statements executed so far, with their parameters.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<Column>> {
        Ok(self
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .unwrap_or_default())
    }

    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push((sql.to_string(), params.to_vec()));
        }
        Ok(self.result.clone())
    }

    async fn close(&self) {}
}
