//! Digest synthesis.

use std::sync::Arc;

use super::prompts::{self, SYNTHESIZE_DIGEST};
use crate::llm::{ModelClient, ModelError};
use crate::types::Summary;

/// Default output budget for the digest.
pub const DEFAULT_DIGEST_MAX_TOKENS: u32 = 1200;

/// Writes the Markdown digest from ranked summaries.
pub struct DigestSynthesizer {
    model: Arc<dyn ModelClient>,
    max_tokens: u32,
}

impl DigestSynthesizer {
    /// Create a synthesiser with the default output budget.
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            max_tokens: DEFAULT_DIGEST_MAX_TOKENS,
        }
    }

    /// Override the output budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Produce the digest. The returned Markdown is not validated.
    ///
    /// # Errors
    ///
    /// Model failures propagate. Serialising the summaries cannot fail in
    /// practice but is reported as [`ModelError::RequestError`] if it does.
    pub async fn synthesize(&self, topic: &str, ranked: &[Summary]) -> Result<String, ModelError> {
        let items_json = serde_json::to_string(ranked)
            .map_err(|e| ModelError::RequestError(format!("could not encode sources: {e}")))?;
        let prompt = prompts::render(
            SYNTHESIZE_DIGEST,
            &[("topic", topic), ("items_json", items_json.as_str())],
        );
        tracing::debug!(sources = ranked.len(), max_tokens = self.max_tokens, "synthesising digest");
        self.model.complete_text(&prompt, self.max_tokens).await
    }
}
