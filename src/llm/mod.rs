//! Model collaborator: text and structured (JSON) completions.
//!
//! [`ModelClient`] is the seam between the pipeline and a hosted language
//! model. Two non-streaming HTTP clients are provided ([`OpenAiClient`],
//! [`AnthropicClient`]); tests and demo mode supply their own implementations.
//!
//! Credentials are passed to constructors explicitly. Nothing in this module
//! reads the environment.

pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use error::{ModelError, error_codes};
pub use json::{JsonMap, ParseOutcome, parse_structured};
pub use openai::{OpenAiClient, OpenAiConfig};

use crate::config::{ModelConfig, ModelProvider};

/// Default output budget for structured completions.
pub const DEFAULT_JSON_MAX_TOKENS: u32 = 600;

/// Build the instruction-prefixed prompt used for structured completions.
pub fn structured_prompt(prompt: &str, schema: &Value) -> String {
    format!(
        "Return ONLY valid JSON matching this schema: {schema}\n\
         If unsure, return an empty JSON object {{}}.\n\n{prompt}"
    )
}

/// A text/JSON completion model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Free-text completion bounded to `max_tokens` of output.
    async fn complete_text(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError>;

    /// Output budget used by the default [`ModelClient::complete_json`].
    fn json_max_tokens(&self) -> u32 {
        DEFAULT_JSON_MAX_TOKENS
    }

    /// Structured completion constrained to `schema`.
    ///
    /// Transport failures propagate. A reply that is not recoverable as a JSON
    /// object yields an empty map.
    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<JsonMap, ModelError> {
        let text = self
            .complete_text(&structured_prompt(prompt, schema), self.json_max_tokens())
            .await?;
        let outcome = parse_structured(&text);
        tracing::debug!(model = self.name(), stage = outcome.stage(), "structured completion parsed");
        Ok(outcome.into_map())
    }
}

/// Build the configured model client with an explicit API key.
///
/// # Errors
///
/// Returns [`ModelError::ConfigError`] if the key is blank or the client
/// cannot be constructed.
pub fn build_model_client(
    config: &ModelConfig,
    api_key: &str,
) -> Result<Arc<dyn ModelClient>, ModelError> {
    let model = config.model_name();
    let client: Arc<dyn ModelClient> = match config.provider {
        ModelProvider::OpenAi => {
            let mut cfg = OpenAiConfig::new(api_key, model)
                .with_temperature(config.temperature)
                .with_json_max_tokens(config.json_max_tokens)
                .with_timeout_secs(config.timeout_seconds);
            if let Some(base) = &config.base_url {
                cfg = cfg.with_base_url(base.clone());
            }
            Arc::new(OpenAiClient::new(cfg)?)
        }
        ModelProvider::Anthropic => {
            let mut cfg = AnthropicConfig::new(api_key, model)
                .with_temperature(config.temperature)
                .with_json_max_tokens(config.json_max_tokens)
                .with_timeout_secs(config.timeout_seconds);
            if let Some(base) = &config.base_url {
                cfg = cfg.with_base_url(base.clone());
            }
            Arc::new(AnthropicClient::new(cfg)?)
        }
    };
    tracing::info!(provider = client.name(), "model client ready");
    Ok(client)
}
