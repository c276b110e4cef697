//! Pipeline data types: summaries, scored views, and the final report.

use serde::{Deserialize, Serialize};
use webdigest_search::SearchResult;

/// A search result enriched by the summariser.
///
/// Exactly one per result that survives cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page URL.
    #[serde(default)]
    pub url: String,
    /// Publication time, as carried from the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Source hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Short summary of the page.
    #[serde(default)]
    pub summary: String,
    /// Key insights, in the order the model gave them.
    #[serde(default)]
    pub insights: Vec<String>,
}

impl Summary {
    /// A summary for `result` with the given text and insights.
    pub fn from_result(
        result: &SearchResult,
        summary: impl Into<String>,
        insights: Vec<String>,
    ) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            published_at: result.published_at.clone(),
            source: result.source.clone(),
            summary: summary.into(),
            insights,
        }
    }
}

/// A summary paired with its score for display. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem<'a> {
    /// The scored summary.
    pub item: &'a Summary,
    /// Relevance score in `[0, 1]`.
    pub score: f64,
}

/// Output of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestReport {
    /// Sanitised topic the run used.
    pub topic: String,
    /// Markdown digest from the model.
    pub digest: String,
    /// Ranked sources the digest was built from.
    pub sources: Vec<Summary>,
}
