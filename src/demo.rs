//! Offline collaborators for running the whole pipeline without keys.
//!
//! [`DemoSearch`] answers every query with canned results dated relative to
//! its clock, including a duplicate and a stale hit so cleaning has work to
//! do. [`DemoModel`] recognises the three prompt kinds and answers each with
//! a fixed reply.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;
use webdigest_search::{SearchError, SearchProvider, SearchResult};

use crate::clock::{Clock, SystemClock};
use crate::llm::{ModelClient, ModelError};

const DIGEST_MARKER: &str = "Markdown digest on: ";

/// Canned search results.
pub struct DemoSearch {
    clock: Arc<dyn Clock>,
}

impl DemoSearch {
    /// Results dated against the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Results dated against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn result(&self, slug: &str, title: &str, snippet: &str, age_days: i64) -> SearchResult {
        let published = self.clock.now() - Duration::days(age_days);
        SearchResult::new(title, format!("https://demo.webdigest.test/{slug}"), snippet)
            .with_published_at(published.to_rfc3339())
            .with_source("demo.webdigest.test")
    }
}

impl Default for DemoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider for DemoSearch {
    async fn search(&self, query: &str, round_index: usize) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!(round_index, "demo search");
        if round_index <= 1 {
            return Ok(vec![
                self.result("overview", &format!("{query}: an overview"), "Where things stand this month.", 2),
                self.result("release", "Major release announced", "A new version ships with breaking changes.", 5),
                self.result("benchmarks", "Independent benchmarks", "Third-party numbers across workloads.", 9),
                self.result("archive", "Background from last year", "Older context, outside most windows.", 400),
            ]);
        }
        Ok(vec![
            self.result(
                &format!("angle-{round_index}"),
                &format!("Follow-up: {query}"),
                "A narrower look at one angle of the topic.",
                i64::try_from(round_index).unwrap_or(1) * 3,
            ),
            // Same page as round one, reached through an anchor.
            self.result("release#changes", "Major release announced", "Duplicate of an earlier hit.", 5),
        ])
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

/// Canned model replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoModel;

#[async_trait]
impl ModelClient for DemoModel {
    fn name(&self) -> &str {
        "demo"
    }

    async fn complete_text(&self, prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
        if prompt.contains("follow-up web search queries") {
            return Ok(json!({
                "queries": ["latest announcements", "expert analysis", "adoption case studies"],
                "entities": ["Demo Corp"]
            })
            .to_string());
        }
        if prompt.contains("Summarise the following web page") {
            return Ok(json!({
                "summary": "Demo summary of this source.",
                "insights": ["Demo insight 1", "Demo insight 2"]
            })
            .to_string());
        }
        let topic = prompt
            .lines()
            .find_map(|line| line.split_once(DIGEST_MARKER).map(|(_, t)| t.trim()))
            .unwrap_or("demo");
        Ok(format!(
            "# {topic}: digest\n\n\
             ## Key takeaways\n\
             - This digest was produced offline in demo mode.\n\
             - Sources below are canned and link nowhere real.\n\n\
             ## Details\n\
             Run without `--demo` and with API keys set to research a real topic.\n"
        ))
    }
}
