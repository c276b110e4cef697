//! Core types for search results and fetched page content.

use serde::{Deserialize, Serialize};

/// A single raw search result returned by a search provider.
///
/// Produced once per provider hit and never mutated afterwards; the
/// aggregation pipeline either drops it or folds it into a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result page.
    #[serde(default)]
    pub title: String,
    /// The URL of the result page.
    #[serde(default)]
    pub url: String,
    /// A text snippet describing the page.
    #[serde(default)]
    pub snippet: String,
    /// Publication time, RFC 3339 when the provider gave something derivable.
    ///
    /// `None` when the provider had no timestamp. A provider string that
    /// could not be normalised is kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Hostname of the result, as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    /// Create a result with just a title, URL and snippet.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            published_at: None,
            source: None,
        }
    }

    /// Attach a publication timestamp.
    #[must_use]
    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    /// Attach a source hostname.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// One-line `"title — snippet"` rendering used to seed query expansion.
    pub fn seed_line(&self) -> String {
        format!("{} — {}", self.title, self.snippet)
    }
}

/// Extracted readable content from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Cleaned, readable text content with HTML boilerplate stripped.
    pub text: String,
    /// Number of words in the extracted text.
    pub word_count: usize,
}
