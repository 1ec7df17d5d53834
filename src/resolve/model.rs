//! Model-backed resolution.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Provenance, ResolvedQuery, Resolver};
use crate::db::{SchemaInfo, Value};
use crate::error::{AskError, Result};
use crate::llm::{build_messages, normalize_sql_response, LlmClient};
use crate::safety::{row_bound, RowBound};

/// Default bound on a whole model call, retries included.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(15);

/// Asks a language model for SQL.
///
/// Every failure is reported as `AskError::Resolution` so the policy can
/// fall back without inspecting the cause.
pub struct LanguageModelResolver {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
    row_cap: u32,
}

impl LanguageModelResolver {
    pub fn new(client: Arc<dyn LlmClient>, row_cap: u32) -> Self {
        Self {
            client,
            timeout: DEFAULT_MODEL_TIMEOUT,
            row_cap,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for LanguageModelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModelResolver")
            .field("client", &self.client.name())
            .field("timeout", &self.timeout)
            .field("row_cap", &self.row_cap)
            .finish()
    }
}

#[async_trait]
impl Resolver for LanguageModelResolver {
    async fn resolve(&self, question: &str, schema: &SchemaInfo) -> Result<ResolvedQuery> {
        let messages = build_messages(question, schema, self.row_cap);

        let response = tokio::time::timeout(self.timeout, self.client.complete(&messages))
            .await
            .map_err(|_| {
                AskError::resolution(format!(
                    "{} did not answer within {:?}",
                    self.client.name(),
                    self.timeout
                ))
            })?
            .map_err(|e| AskError::resolution(e.message()))?;

        let sql = normalize_sql_response(&response);
        if sql.is_empty() {
            return Err(AskError::resolution("Model returned an empty query"));
        }

        debug!(client = self.client.name(), sql = %sql, "Model produced query");
        Ok(bound_rows(sql, self.row_cap))
    }

    fn provenance(&self) -> Provenance {
        Provenance::Model
    }
}

/// Applies the row cap to model text.
///
/// A query with no LIMIT, or one above the cap, is wrapped in an outer
/// `LIMIT ?`. Ungrouped aggregates are marked as such and left alone. Text
/// that is not a single query passes through for the read-only guard.
fn bound_rows(sql: String, row_cap: u32) -> ResolvedQuery {
    match row_bound(&sql) {
        Some(RowBound::SingleRow) => ResolvedQuery {
            aggregate: true,
            ..ResolvedQuery::from_model(sql)
        },
        Some(RowBound::Limit(Some(limit))) if limit <= u64::from(row_cap) => {
            ResolvedQuery::from_model(sql)
        }
        Some(_) => {
            let inner = sql.trim_end().trim_end_matches(';').trim_end();
            debug!(row_cap, "Wrapping model query in a row cap");
            ResolvedQuery {
                // Newline keeps a trailing line comment from swallowing the paren
                sql: format!("SELECT * FROM ({inner}\n) LIMIT ?"),
                params: vec![Value::from(row_cap)],
                ..ResolvedQuery::from_model(String::new())
            }
        }
        None => ResolvedQuery::from_model(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Column;
    use crate::llm::{FailingLlmClient, MockLlmClient, SlowLlmClient};

    fn schema() -> SchemaInfo {
        SchemaInfo::new("companies", vec![Column::new("CompanyName", "TEXT")])
    }

    #[tokio::test]
    async fn test_fenced_response_is_normalized() {
        let client = MockLlmClient::new().with_response(
            "dormant",
            "```sql\nSELECT \"CompanyName\" FROM companies LIMIT 10\n```",
        );
        let resolver = LanguageModelResolver::new(Arc::new(client), 10);

        let query = resolver.resolve("dormant companies", &schema()).await.unwrap();
        assert_eq!(query.sql, "SELECT \"CompanyName\" FROM companies LIMIT 10");
        assert_eq!(query.provenance, Provenance::Model);
        assert!(query.params.is_empty());
    }

    #[tokio::test]
    async fn test_unlimited_answer_is_wrapped_in_row_cap() {
        let client = MockLlmClient::new().with_response("all", "SELECT * FROM companies;");
        let resolver = LanguageModelResolver::new(Arc::new(client), 10);

        let query = resolver.resolve("all companies", &schema()).await.unwrap();
        assert_eq!(query.sql, "SELECT * FROM (SELECT * FROM companies\n) LIMIT ?");
        assert_eq!(query.params, vec![Value::Int(10)]);
        assert_eq!(query.provenance, Provenance::Model);
        assert!(!query.aggregate);
    }

    #[test]
    fn test_row_cap_applies_only_where_needed() {
        let over_cap = bound_rows("SELECT * FROM companies LIMIT 500".into(), 10);
        assert_eq!(
            over_cap.sql,
            "SELECT * FROM (SELECT * FROM companies LIMIT 500\n) LIMIT ?"
        );
        assert_eq!(over_cap.params, vec![Value::Int(10)]);

        let within_cap = bound_rows("SELECT * FROM companies LIMIT 3".into(), 10);
        assert_eq!(within_cap.sql, "SELECT * FROM companies LIMIT 3");
        assert!(within_cap.params.is_empty());

        let count = bound_rows("SELECT COUNT(*) AS total FROM companies".into(), 10);
        assert_eq!(count.sql, "SELECT COUNT(*) AS total FROM companies");
        assert!(count.aggregate);

        let write = bound_rows("DELETE FROM companies".into(), 10);
        assert_eq!(write.sql, "DELETE FROM companies");
        assert!(write.params.is_empty());
    }

    #[tokio::test]
    async fn test_empty_response_is_resolution_failure() {
        let client = MockLlmClient::new().with_response("anything", "```sql\n```");
        let resolver = LanguageModelResolver::new(Arc::new(client), 10);

        let err = resolver.resolve("anything", &schema()).await.unwrap_err();
        assert!(matches!(err, AskError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_resolution_failure() {
        let resolver = LanguageModelResolver::new(Arc::new(FailingLlmClient::default()), 10);

        let err = resolver.resolve("list companies", &schema()).await.unwrap_err();
        assert!(matches!(err, AskError::Resolution(_)));
        assert!(err.message().contains("simulated provider outage"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_resolution_failure() {
        let client = SlowLlmClient::new(Duration::from_secs(60));
        let resolver = LanguageModelResolver::new(Arc::new(client), 10)
            .with_timeout(Duration::from_millis(50));

        let err = resolver.resolve("list companies", &schema()).await.unwrap_err();
        assert!(matches!(err, AskError::Resolution(_)));
        assert!(err.message().contains("did not answer"));
    }
}
