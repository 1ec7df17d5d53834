//! The question-answering engine.
//!
//! An `Engine` is built once at startup and owns everything a request needs:
//! the storage client, the schema catalog, the resolution policy and the
//! executor. Each operation here is what a transport adapter calls.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::SchemaCatalog;
use crate::config::Config;
use crate::db::{self, quote_ident, Column, DatabaseClient, QueryResult, SchemaInfo, Value};
use crate::error::{AskError, Result};
use crate::llm::{create_client, resolve_api_key, LlmClient};
use crate::query::QueryExecutor;
use crate::resolve::{LanguageModelResolver, ResolutionPolicy, ResolvedQuery, RuleBasedResolver};

/// Default page size for table browsing.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size table browsing accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// An answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub question: String,
    pub query: ResolvedQuery,
    pub result: QueryResult,
}

/// Paging and projection for `read_table_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
    /// Columns to return, spelled exactly as stored. `None` returns all.
    pub columns: Option<Vec<String>>,
    /// Boolean expression placed in the WHERE clause.
    pub filter: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            columns: None,
            filter: None,
        }
    }
}

/// One page of table rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub data: Vec<Map<String, JsonValue>>,
    pub limit: u32,
    pub offset: u64,
}

/// Schema dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDump {
    pub schema: Arc<SchemaInfo>,
    pub llm_available: bool,
}

/// Health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub total_rows: i64,
    pub llm_available: bool,
}

pub struct Engine {
    db: Arc<dyn DatabaseClient>,
    catalog: SchemaCatalog,
    policy: ResolutionPolicy,
    executor: QueryExecutor,
}

impl Engine {
    /// Opens storage and builds the engine from configuration.
    ///
    /// A missing model credential selects rule-based resolution; it is not
    /// an error.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db: Arc<dyn DatabaseClient> = Arc::from(db::connect(&config.database).await?);
        let client = model_client(config)?;
        Self::with_client(db, config, client).await
    }

    /// Builds the engine over an existing storage client and optional model client.
    pub async fn with_client(
        db: Arc<dyn DatabaseClient>,
        config: &Config,
        client: Option<Arc<dyn LlmClient>>,
    ) -> Result<Self> {
        let catalog = SchemaCatalog::load(
            db.clone(),
            config.database.table.clone(),
            config.database.sample_rows,
            config.schema.refresh,
        )
        .await?;

        let row_cap = config.resolution.row_cap;
        let rules = RuleBasedResolver::new(row_cap);
        let policy = match client {
            Some(client) => {
                info!(client = client.name(), "Model resolution enabled");
                let model = LanguageModelResolver::new(client, row_cap)
                    .with_timeout(Duration::from_secs(config.llm.timeout_secs));
                ResolutionPolicy::with_primary(Arc::new(model), rules)
            }
            None => {
                info!("Model resolution disabled; answering with rules");
                ResolutionPolicy::rules_only(rules)
            }
        };

        Ok(Self {
            executor: QueryExecutor::new(db.clone()),
            db,
            catalog,
            policy,
        })
    }

    /// Resolves and executes a question.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::validation("Question is required"));
        }

        let schema = self.catalog.describe().await?;
        let query = self.policy.resolve(question, &schema).await;
        debug!(sql = %query.sql, params = query.params.len(), "Resolved query");

        let result = self.executor.execute(&query).await?;
        Ok(Answer {
            question: question.to_string(),
            query,
            result,
        })
    }

    /// Like `ask`, but gives up with `Cancelled` as soon as `token` fires.
    pub async fn ask_cancellable(
        &self,
        question: &str,
        token: &CancellationToken,
    ) -> Result<Answer> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Question cancelled");
                Err(AskError::Cancelled)
            }
            answer = self.ask(question) => answer,
        }
    }

    /// Lists user tables.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.db.list_tables().await
    }

    /// Describes a table's columns.
    pub async fn describe_table(&self, table: &str) -> Result<Vec<Column>> {
        let columns = self.db.table_columns(table).await?;
        if columns.is_empty() {
            return Err(AskError::not_found(format!("Table '{}' not found", table)));
        }
        Ok(columns)
    }

    /// Reads one page of rows from a table.
    ///
    /// The filter is embedded verbatim, so the finished statement goes through
    /// the same read-only guard as any resolved query.
    pub async fn read_table_data(&self, table: &str, page: &PageRequest) -> Result<TablePage> {
        if !(1..=MAX_PAGE_SIZE).contains(&page.limit) {
            return Err(AskError::validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        let offset = i64::try_from(page.offset)
            .map_err(|_| AskError::validation("offset is too large"))?;

        let stored = self.describe_table(table).await?;
        let projection = match &page.columns {
            Some(requested) if !requested.is_empty() => {
                let unknown = requested
                    .iter()
                    .filter(|name| !stored.iter().any(|c| &c.name == *name))
                    .map(String::as_str)
                    .collect::<Vec<_>>();
                if !unknown.is_empty() {
                    return Err(AskError::validation(format!(
                        "Invalid columns: {}",
                        unknown.join(", ")
                    )));
                }
                requested
                    .iter()
                    .map(|name| quote_ident(name))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(table));
        if let Some(filter) = page.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            sql.push_str(&format!(" WHERE ({})", filter));
        }
        sql.push_str(" LIMIT ? OFFSET ?");

        let result = self
            .executor
            .execute_sql(&sql, &[Value::from(page.limit), Value::Int(offset)])
            .await?;

        Ok(TablePage {
            data: result.records(),
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Current schema snapshot plus model availability.
    pub async fn schema(&self) -> Result<SchemaDump> {
        Ok(SchemaDump {
            schema: self.catalog.describe().await?,
            llm_available: self.policy.model_available(),
        })
    }

    /// Counts the table's rows to prove storage is reachable.
    pub async fn health(&self) -> Result<Health> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(self.catalog.table()));
        let result = self
            .executor
            .execute_sql(&sql, &[])
            .await
            .map_err(|e| {
                AskError::data_unavailable(format!("Database connection failed: {}", e.message()))
            })?;

        let total_rows = result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0);

        Ok(Health {
            status: "healthy",
            database: "connected",
            total_rows,
            llm_available: self.policy.model_available(),
        })
    }

    /// Whether questions are tried against a model first.
    pub fn llm_available(&self) -> bool {
        self.policy.model_available()
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Closes storage connections.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("catalog", &self.catalog)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Builds the configured model client, or `None` when the model path is
/// disabled or has no credential.
fn model_client(config: &Config) -> Result<Option<Arc<dyn LlmClient>>> {
    let Some(provider) = config.llm.provider()? else {
        return Ok(None);
    };

    match create_client(provider, resolve_api_key(provider), &config.llm) {
        Ok(client) => Ok(Some(Arc::from(client))),
        Err(AskError::Llm(reason)) => {
            debug!(%provider, "{}", reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
