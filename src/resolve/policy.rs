//! Strategy selection with guaranteed fallback.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ResolvedQuery, Resolver, RuleBasedResolver};
use crate::db::SchemaInfo;

/// Chooses between the model and the rules.
///
/// With a primary resolver configured it is tried first; any failure, or no
/// primary at all, falls back to the rule-based resolver. `resolve` therefore
/// never fails.
#[derive(Clone)]
pub struct ResolutionPolicy {
    primary: Option<Arc<dyn Resolver>>,
    fallback: RuleBasedResolver,
}

impl ResolutionPolicy {
    /// Rule-based resolution only.
    pub fn rules_only(fallback: RuleBasedResolver) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }

    /// Tries `primary` before falling back to the rules.
    pub fn with_primary(primary: Arc<dyn Resolver>, fallback: RuleBasedResolver) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// Whether a model-backed primary is configured.
    pub fn model_available(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback(&self) -> &RuleBasedResolver {
        &self.fallback
    }

    pub async fn resolve(&self, question: &str, schema: &SchemaInfo) -> ResolvedQuery {
        if let Some(primary) = &self.primary {
            match primary.resolve(question, schema).await {
                Ok(query) => {
                    info!(provenance = %query.provenance, "Resolved question");
                    return query;
                }
                Err(e) => {
                    warn!("{}; falling back to rules", e);
                }
            }
        } else {
            debug!("No model configured; using rules");
        }

        let query = self.fallback.resolve_question(question, schema);
        info!(provenance = %query.provenance, "Resolved question");
        query
    }
}

impl std::fmt::Debug for ResolutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPolicy")
            .field("model_available", &self.model_available())
            .field("fallback", &self.fallback)
            .finish()
    }
}
