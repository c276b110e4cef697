//! Anthropic Messages API client (non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::error::{ModelError, map_http_error};
use super::{DEFAULT_JSON_MAX_TOKENS, ModelClient};

/// Default Anthropic API base URL.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// Configuration for the Anthropic client.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// Anthropic API key.
    pub api_key: String,
    /// Base URL for the API (defaults to `https://api.anthropic.com`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API version header value.
    pub api_version: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output budget for structured completions.
    pub json_max_tokens: u32,
    /// Transport timeout per request.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicConfig {
    /// Create a new Anthropic config.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            model: model.into(),
            api_version: "2023-06-01".to_string(),
            temperature: 0.2,
            json_max_tokens: DEFAULT_JSON_MAX_TOKENS,
            timeout_secs: 60,
        }
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
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

/// Anthropic Messages API client.
#[derive(Debug)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ConfigError`] if the key is blank or the HTTP
    /// client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::ConfigError(
                "Anthropic API key is not set (ANTHROPIC_API_KEY)".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ModelError::ConfigError(format!("HTTP client build failed: {e}")))?;
        Ok(Self { config, client })
    }
}

/// Build the JSON request body for a single user message.
pub fn build_messages_request(model: &str, prompt: &str, max_tokens: u32, temperature: f32) -> Value {
    json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": temperature,
        "messages": [{"role": "user", "content": prompt}],
    })
}

/// Concatenate the text blocks of a Messages API response.
pub fn parse_response(body: &Value) -> Result<String, ModelError> {
    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::ResponseError("Anthropic response has no content".into()))?;

    Ok(blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect())
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn json_max_tokens(&self) -> u32 {
        self.config.json_max_tokens
    }

    async fn complete_text(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        tracing::trace!(prompt, max_tokens, "Anthropic completion");
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let body =
            build_messages_request(&self.config.model, prompt, max_tokens, self.config.temperature);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::from_send("Anthropic", e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Anthropic request rejected");
            return Err(map_http_error("Anthropic", status, &body_text));
        }

        let value: Value = response.json().await.map_err(|e| {
            ModelError::ResponseError(format!("Anthropic response is not JSON: {e}"))
        })?;
        parse_response(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AnthropicConfig::new("sk-ant", DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.api_version, "2023-06-01");
        assert_eq!(config.json_max_tokens, 600);
    }

    #[test]
    fn debug_hides_key() {
        let config = AnthropicConfig::new("sk-ant-secret", "m");
        assert!(!format!("{config:?}").contains("sk-ant-secret"));
    }

    #[test]
    fn blank_key_rejected() {
        let err = AnthropicClient::new(AnthropicConfig::new(" ", "m")).unwrap_err();
        assert!(err.message().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn request_body_shape() {
        let body = build_messages_request("claude", "hi", 600, 0.2);
        assert_eq!(body["max_tokens"], 600);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!(body.get("system").is_none());
    }

    #[test]
    fn text_blocks_concatenated() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Part one. "},
                {"type": "tool_use", "id": "x", "name": "n", "input": {}},
                {"type": "text", "text": "Part two."}
            ]
        });
        assert_eq!(parse_response(&body).expect("text"), "Part one. Part two.");
    }

    #[test]
    fn missing_content_is_invalid() {
        let err = parse_response(&json!({"type": "message"})).unwrap_err();
        assert_eq!(err.code(), "RESPONSE_INVALID");
    }
}
