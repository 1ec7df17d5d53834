//! Question resolution.
//!
//! Turns a free-text question into a single bounded, read-only query. Two
//! strategies implement [`Resolver`]: a model-backed one that may fail and a
//! rule-based one that never does. [`ResolutionPolicy`] picks between them.

mod model;
mod policy;
mod rules;

pub use model::LanguageModelResolver;
pub use policy::ResolutionPolicy;
pub use rules::{RuleBasedResolver, DEFAULT_ROW_CAP, MAX_REQUESTED_ROWS};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::db::{SchemaInfo, Value};
use crate::error::Result;

/// Which strategy produced a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Rule,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Rule => write!(f, "rule"),
        }
    }
}

/// A query ready for execution.
///
/// `sql` holds one statement whose `?` placeholders line up with `params`.
/// Non-aggregate queries always carry a row cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuery {
    pub sql: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
    pub provenance: Provenance,
    /// Single-row aggregate (e.g. a count); exempt from the row cap.
    pub aggregate: bool,
}

impl ResolvedQuery {
    /// A model-produced query. Model text never carries parameters.
    pub fn from_model(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            provenance: Provenance::Model,
            aggregate: false,
        }
    }

    /// A rule-produced query with bound parameters.
    pub fn from_rule(sql: impl Into<String>, params: Vec<Value>, aggregate: bool) -> Self {
        Self {
            sql: sql.into(),
            params,
            provenance: Provenance::Rule,
            aggregate,
        }
    }
}

/// A strategy that maps a question to a query against the snapshot table.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves a question. Model-backed implementations fail with
    /// `AskError::Resolution`; rule-based ones always succeed.
    async fn resolve(&self, question: &str, schema: &SchemaInfo) -> Result<ResolvedQuery>;

    /// The provenance tag this strategy stamps on its queries.
    fn provenance(&self) -> Provenance;
}
