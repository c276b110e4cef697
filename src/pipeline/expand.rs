//! Model-driven query expansion.

use std::sync::Arc;

use serde_json::{Value, json};

use super::prompts::{self, REFINE_QUERY};
use crate::llm::json::string_list;
use crate::llm::{ModelClient, ModelError};

/// Most follow-up queries a run will search.
pub const MAX_EXPANDED_QUERIES: usize = 5;

/// Queries and entities derived from seed results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Follow-up queries, in model order, at most [`MAX_EXPANDED_QUERIES`].
    pub queries: Vec<String>,
    /// Entities the model noticed. Informational only.
    pub entities: Vec<String>,
}

/// Schema for the expansion completion.
pub fn expansion_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "queries": {"type": "array", "items": {"type": "string"}},
            "entities": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["queries"]
    })
}

/// Derives follow-up queries from round-one results.
pub struct QueryExpander {
    model: Arc<dyn ModelClient>,
    limit: usize,
}

impl QueryExpander {
    /// Create an expander returning at most [`MAX_EXPANDED_QUERIES`] queries.
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            limit: MAX_EXPANDED_QUERIES,
        }
    }

    /// Lower the query cap. Values above [`MAX_EXPANDED_QUERIES`] are clamped.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_EXPANDED_QUERIES);
        self
    }

    /// Ask the model for follow-up queries.
    ///
    /// # Errors
    ///
    /// Model transport failures propagate. An empty or garbled completion
    /// yields zero queries.
    pub async fn expand(
        &self,
        topic: &str,
        seed_snippets: &[String],
    ) -> Result<Expansion, ModelError> {
        let bullets = seed_snippets
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = prompts::render(REFINE_QUERY, &[("topic", topic), ("bullets", bullets.as_str())]);

        let reply = self.model.complete_json(&prompt, &expansion_schema()).await?;

        let mut queries = string_list(&reply, "queries");
        queries.truncate(self.limit);
        let entities = string_list(&reply, "entities");

        tracing::debug!(
            queries = queries.len(),
            entities = entities.len(),
            "query expansion complete"
        );
        Ok(Expansion { queries, entities })
    }
}
