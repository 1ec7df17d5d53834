//! Read-only query execution.
//!
//! Every statement passes the safety guard before it reaches storage,
//! whichever strategy produced it.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::db::{DatabaseClient, QueryResult, Value};
use crate::error::Result;
use crate::resolve::ResolvedQuery;
use crate::safety::ensure_read_only;

/// Runs resolved queries against storage.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
}

impl QueryExecutor {
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Validates and executes a resolved query.
    pub async fn execute(&self, query: &ResolvedQuery) -> Result<QueryResult> {
        self.execute_sql(&query.sql, &query.params).await
    }

    /// Validates and executes raw statement text with positional parameters.
    ///
    /// Anything other than exactly one read-only statement is rejected with a
    /// `Query` error and never sent to storage.
    pub async fn execute_sql(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        ensure_read_only(sql)?;

        let start = Instant::now();
        let result = self.db.execute_query(sql, params).await?;
        debug!(
            rows = result.row_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Executed query"
        );

        if let Some(warning) = result.truncation_warning() {
            warn!("{}", warning);
        }

        Ok(result)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor").finish_non_exhaustive()
    }
}
