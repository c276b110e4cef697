//! OpenAI Chat Completions client (non-streaming).
//!
//! Sends a system prompt plus the user prompt to `/v1/chat/completions` and
//! returns the first choice's message content.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::error::{ModelError, map_http_error};
use super::{DEFAULT_JSON_MAX_TOKENS, ModelClient};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a concise analyst.";

/// Configuration for the OpenAI client.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL (defaults to `https://api.openai.com`).
    pub base_url: String,
    /// The model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output budget for structured completions.
    pub json_max_tokens: u32,
    /// Transport timeout per request.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.into(),
            model: model.into(),
            temperature: 0.2,
            json_max_tokens: DEFAULT_JSON_MAX_TOKENS,
            timeout_secs: 60,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the structured completion budget.
    pub fn with_json_max_tokens(mut self, max_tokens: u32) -> Self {
        self.json_max_tokens = max_tokens;
        self
    }

    /// Set the transport timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OpenAI Chat Completions client.
#[derive(Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ConfigError`] if the key is blank or the HTTP
    /// client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::ConfigError(
                "OpenAI API key is not set (OPENAI_API_KEY)".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ModelError::ConfigError(format!("HTTP client build failed: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Build the JSON request body for a single-turn completion.
pub fn build_request(model: &str, prompt: &str, max_tokens: u32, temperature: f32) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ],
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

/// Extract the first choice's text from a response body.
pub fn parse_response(body: &Value) -> Result<String, ModelError> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| content.trim().to_owned())
        .ok_or_else(|| ModelError::ResponseError("OpenAI response has no message content".into()))
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn json_max_tokens(&self) -> u32 {
        self.config.json_max_tokens
    }

    async fn complete_text(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        tracing::trace!(prompt, max_tokens, "OpenAI completion");
        let body = build_request(&self.config.model, prompt, max_tokens, self.config.temperature);

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::from_send("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "OpenAI request rejected");
            return Err(map_http_error("OpenAI", status, &body_text));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ModelError::ResponseError(format!("OpenAI response is not JSON: {e}")))?;
        parse_response(&value)
    }
}
