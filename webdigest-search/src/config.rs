//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls the provider endpoint, result count, timeouts,
//! and request behaviour. Credentials are never part of the configuration;
//! they are passed to provider constructors explicitly.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Default Brave Web Search API endpoint.
pub const DEFAULT_BRAVE_BASE_URL: &str = "https://api.search.brave.com";

/// Configuration for the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search API (overridable for tests and proxies).
    pub base_url: String,
    /// Number of results requested per round.
    pub count: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Recency hint, in days, appended to each query as `newer_than:<N>d`.
    pub recency_days: u32,
    /// Request strict safe-search instead of moderate.
    pub strict: bool,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BRAVE_BASE_URL.to_owned(),
            count: 20,
            timeout_seconds: 20,
            recency_days: 30,
            strict: false,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `count` must be between 1 and 20 (the Brave API maximum)
    /// - `timeout_seconds` must be greater than 0
    /// - `base_url` must not be empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.count == 0 || self.count > 20 {
            return Err(SearchError::Config(
                "count must be between 1 and 20".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(SearchError::Config("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Safe-search level sent to the provider.
    pub fn safe_search_level(&self) -> &'static str {
        if self.strict {
            "strict"
        } else {
            "moderate"
        }
    }
}
