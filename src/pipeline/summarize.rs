//! Per-source summarisation.
//!
//! Each surviving search result is turned into exactly one [`Summary`]. Page
//! text is fetched best effort: a page that cannot be downloaded is
//! summarised from an empty body (the model still sees title and URL, and
//! the result snippet backs up a missing summary).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use webdigest_search::{PageClient, SearchConfig, SearchError, SearchResult};

use super::prompts::{self, SUMMARIZE_SOURCE};
use crate::llm::json::{string_field, string_list};
use crate::llm::{ModelClient, ModelError};
use crate::types::Summary;

/// Source of page text for summaries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Readable text of `url`, or an empty string when unavailable.
    async fn fetch_text(&self, url: &str) -> String;
}

/// Fetches pages over HTTP and extracts their readable text.
///
/// One HTTP client is shared by every fetch in a run.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    pages: PageClient,
    max_chars: usize,
}

impl HttpPageFetcher {
    /// Create a fetcher that keeps at most `max_chars` characters per page.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig, max_chars: usize) -> Result<Self, SearchError> {
        Ok(Self {
            pages: PageClient::new(config)?,
            max_chars,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        if url.trim().is_empty() {
            return String::new();
        }
        match self.pages.fetch(url, self.max_chars).await {
            Ok(page) => page.text,
            Err(e) => {
                tracing::debug!(url, error = %e, "page fetch failed, summarising without body");
                String::new()
            }
        }
    }
}

/// Never fetches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl PageFetcher for OfflineFetcher {
    async fn fetch_text(&self, _url: &str) -> String {
        String::new()
    }
}

/// Schema for the summary completion.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "url": {"type": "string"},
            "published_at": {"type": "string"},
            "summary": {"type": "string"},
            "insights": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["summary"]
    })
}

/// Turns search results into summaries with the model collaborator.
pub struct Summarizer {
    model: Arc<dyn ModelClient>,
    fetcher: Arc<dyn PageFetcher>,
    page_text_chars: usize,
}

impl Summarizer {
    /// Create a summariser that prompts with at most `page_text_chars` of page text.
    pub fn new(
        model: Arc<dyn ModelClient>,
        fetcher: Arc<dyn PageFetcher>,
        page_text_chars: usize,
    ) -> Self {
        Self {
            model,
            fetcher,
            page_text_chars,
        }
    }

    /// Summarise one result.
    ///
    /// Title, URL and source always come from the result. `published_at`
    /// comes from the result, falling back to a date the model read off the
    /// page. A missing summary falls back to the result snippet.
    ///
    /// # Errors
    ///
    /// Model transport failures propagate.
    pub async fn summarize(&self, result: &SearchResult) -> Result<Summary, ModelError> {
        let page_text = self.fetcher.fetch_text(&result.url).await;
        let content: String = page_text.chars().take(self.page_text_chars).collect();

        let prompt = prompts::render(
            SUMMARIZE_SOURCE,
            &[
                ("title", result.title.as_str()),
                ("url", result.url.as_str()),
                ("content", content.as_str()),
            ],
        );
        let reply = self.model.complete_json(&prompt, &summary_schema()).await?;

        let summary = string_field(&reply, "summary").unwrap_or_else(|| result.snippet.clone());
        let insights = string_list(&reply, "insights");
        let mut item = Summary::from_result(result, summary, insights);
        if item.published_at.is_none() {
            item.published_at = string_field(&reply, "published_at");
        }

        tracing::trace!(url = %item.url, insights = item.insights.len(), "source summarised");
        Ok(item)
    }
}
