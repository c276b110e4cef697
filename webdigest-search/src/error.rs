//! Error types for the webdigest-search crate.
//!
//! All errors use stable string messages suitable for display to users.
//! No API keys or sensitive data appear in error messages.

/// Errors that can occur while talking to a search provider or fetching pages.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A required credential or setting is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// A search request timed out.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl SearchError {
    /// Returns `true` for errors caused by local configuration rather than
    /// the remote provider.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Convenience type alias for webdigest-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
