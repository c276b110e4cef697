//! Error types for the model collaborator.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`ModelError::code()`].

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing configuration (including a missing API key).
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Authentication failed (invalid API key).
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// Request to the model provider failed or was rate limited.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// Request timed out.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Provider returned a non-success status not covered above.
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";

    /// Provider returned a 2xx body that does not have the expected shape.
    pub const RESPONSE_INVALID: &str = "RESPONSE_INVALID";
}

/// Errors produced by model clients.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// Authentication failed.
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    AuthError(String),

    /// Transport failure or rate limit.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    RequestError(String),

    /// Request timed out.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    TimeoutError(String),

    /// Non-success HTTP status.
    #[error("[{}] {}", error_codes::PROVIDER_ERROR, .0)]
    ProviderError(String),

    /// Malformed success response.
    #[error("[{}] {}", error_codes::RESPONSE_INVALID, .0)]
    ResponseError(String),
}

impl ModelError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::AuthError(_) => error_codes::AUTH_FAILED,
            Self::RequestError(_) => error_codes::REQUEST_FAILED,
            Self::TimeoutError(_) => error_codes::TIMEOUT_ERROR,
            Self::ProviderError(_) => error_codes::PROVIDER_ERROR,
            Self::ResponseError(_) => error_codes::RESPONSE_INVALID,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::AuthError(m)
            | Self::RequestError(m)
            | Self::TimeoutError(m)
            | Self::ProviderError(m)
            | Self::ResponseError(m) => m,
        }
    }

    /// Map a reqwest send failure, separating timeouts from other transport errors.
    pub(crate) fn from_send(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(format!("{provider} request timed out: {err}"))
        } else {
            Self::RequestError(format!("{provider} request failed: {err}"))
        }
    }
}

/// Convenience alias for model results.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Map a non-success HTTP status and body to a [`ModelError`].
pub(crate) fn map_http_error(provider: &str, status: reqwest::StatusCode, body: &str) -> ModelError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ModelError::AuthError(format!("{provider} authentication failed: {message}")),
        429 => ModelError::RequestError(format!("{provider} rate limited: {message}")),
        code => ModelError::ProviderError(format!("{provider} HTTP {code}: {message}")),
    }
}

/// Extract an error message from a provider error body.
///
/// Both OpenAI and Anthropic nest it under `error.message`.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
