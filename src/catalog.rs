//! Schema snapshot for the queryable table.
//!
//! The snapshot is captured once and shared read-only. With
//! `schema.refresh = "per_request"` every `describe` re-reads storage instead.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SchemaRefresh;
use crate::db::{quote_ident, DatabaseClient, SchemaInfo, Value};
use crate::error::{AskError, Result};

/// Owns the table description used for prompts and column resolution.
pub struct SchemaCatalog {
    db: Arc<dyn DatabaseClient>,
    table: String,
    sample_rows: usize,
    refresh: SchemaRefresh,
    snapshot: RwLock<Arc<SchemaInfo>>,
}

impl SchemaCatalog {
    /// Introspects the table and builds the catalog.
    ///
    /// Fails with `DataUnavailable` if storage is unreachable or the table
    /// has no columns.
    pub async fn load(
        db: Arc<dyn DatabaseClient>,
        table: impl Into<String>,
        sample_rows: usize,
        refresh: SchemaRefresh,
    ) -> Result<Self> {
        let table = table.into();
        let snapshot = introspect(db.as_ref(), &table, sample_rows).await?;
        info!(
            table = %snapshot.table_name,
            columns = snapshot.columns.len(),
            "Captured schema snapshot"
        );

        Ok(Self {
            db,
            table,
            sample_rows,
            refresh,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Returns the current snapshot, re-reading it first when configured to.
    pub async fn describe(&self) -> Result<Arc<SchemaInfo>> {
        match self.refresh {
            SchemaRefresh::Startup => Ok(self.snapshot.read().await.clone()),
            SchemaRefresh::PerRequest => self.refresh().await,
        }
    }

    /// Forces a new snapshot.
    pub async fn refresh(&self) -> Result<Arc<SchemaInfo>> {
        let snapshot = Arc::new(introspect(self.db.as_ref(), &self.table, self.sample_rows).await?);
        *self.snapshot.write().await = snapshot.clone();
        debug!(table = %self.table, "Refreshed schema snapshot");
        Ok(snapshot)
    }

    /// The configured table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("table", &self.table)
            .field("sample_rows", &self.sample_rows)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

async fn introspect(db: &dyn DatabaseClient, table: &str, sample_rows: usize) -> Result<SchemaInfo> {
    let columns = db.table_columns(table).await?;
    if columns.is_empty() {
        return Err(AskError::data_unavailable(format!(
            "Table '{}' does not exist or has no columns",
            table
        )));
    }

    let samples = if sample_rows == 0 {
        Vec::new()
    } else {
        let sql = format!("SELECT * FROM {} LIMIT ?", quote_ident(table));
        db.execute_query(&sql, &[Value::from(sample_rows as i64)])
            .await
            .map_err(|e| {
                AskError::data_unavailable(format!("Failed to sample {}: {}", table, e.message()))
            })?
            .records()
    };

    Ok(SchemaInfo::new(table, columns).with_sample_rows(samples))
}
