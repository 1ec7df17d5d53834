//! Storage abstraction layer for askdb.
//!
//! Provides a trait-based interface for the read-only storage operations the
//! engine needs, with a SQLite implementation.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::MockDatabaseClient;
pub use schema::{quote_ident, Column, SchemaInfo};
pub use sqlite::{SqliteClient, MAX_ROWS};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens the configured storage.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = SqliteClient::open(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for storage clients.
///
/// Implementations never write. Introspection failures are `DataUnavailable`;
/// statement failures are `Query` errors carrying the statement text.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Lists user tables.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Returns the columns of a table in declaration order. Empty if the table is unknown.
    async fn table_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Executes one statement with positional parameters and returns its rows.
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Closes the underlying connections.
    async fn close(&self);
}
