//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! over a pool of read-only sqlx connections.

use crate::config::DatabaseConfig;
use crate::db::{Column, ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Hard ceiling on rows returned from any single query.
pub const MAX_ROWS: usize = 1000;

/// Idle pooled connections are closed after this long.
const IDLE_TIMEOUT_SECS: u64 = 30;

/// SQLite database client. Every connection is opened read-only.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens a read-only pool for the configured database file.
    ///
    /// Fails with `DataUnavailable` if the file is missing or cannot be opened.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = &config.path;
        if !path.exists() {
            return Err(AskError::data_unavailable(format!(
                "Database file {} does not exist",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(0)
            .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| map_connection_error(e, path))?;

        debug!("Opened read-only pool for {}", path.display());
        Ok(Self { pool })
    }

    /// Creates a client from an existing connection pool.
    ///
    /// The caller is responsible for the pool's access mode.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches column metadata for a statement that produced no rows.
    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                warn!("Could not prepare statement for column metadata: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AskError::data_unavailable(format!("Failed to list tables: {e}")))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT name, type
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AskError::data_unavailable(format!("Failed to fetch columns for {table}: {e}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| Column::new(name, data_type))
            .collect())
    }

    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start = Instant::now();

        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<String>),
                Value::Int(i) => query.bind(*i),
                Value::Float(f) => query.bind(*f),
                Value::String(s) => query.bind(s.clone()),
                Value::Bytes(b) => query.bind(b.clone()),
            };
        }

        // Stop reading one row past the ceiling so huge results never load
        let fetch = async {
            let mut stream = query.fetch(&self.pool);
            let mut fetched: Vec<SqliteRow> = Vec::new();
            while let Some(row) = stream.try_next().await? {
                fetched.push(row);
                if fetched.len() > MAX_ROWS {
                    break;
                }
            }
            Ok::<_, sqlx::Error>(fetched)
        };

        let mut result = tokio::time::timeout(Duration::from_secs(QUERY_TIMEOUT_SECS), fetch)
            .await
            .map_err(|_| {
                AskError::query(
                    format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"),
                    sql,
                )
            })?
            .map_err(|e| AskError::query(format_query_error(&e), sql))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = if let Some(first_row) = result.first() {
            first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        } else {
            self.fetch_column_metadata(sql).await
        };

        let was_truncated = result.len() > MAX_ROWS;
        if was_truncated {
            warn!("Query returned more than {} rows, truncating", MAX_ROWS);
            result.truncate(MAX_ROWS);
        }

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            was_truncated,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single cell using its runtime storage class.
///
/// SQLite is dynamically typed, so the declared column type is only a hint;
/// the value's own type decides how it is decoded.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let as_text = || {
        row.try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null)
    };

    match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or_else(|_| as_text()),

        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or_else(|_| as_text()),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => as_text(),
    }
}

/// Maps sqlx connection errors to user-facing messages.
fn map_connection_error(error: sqlx::Error, path: &Path) -> AskError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("unable to open") || error_str.contains("no such file") {
        AskError::data_unavailable(format!("Cannot open database {}", path.display()))
    } else if error_str.contains("not a database") || error_str.contains("malformed") {
        AskError::data_unavailable(format!(
            "{} is not a readable SQLite database",
            path.display()
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        AskError::data_unavailable(format!(
            "Timed out opening {}. The file may be locked.",
            path.display()
        ))
    } else {
        AskError::data_unavailable(error.to_string())
    }
}

/// Extracts the storage message from a query error.
fn format_query_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
