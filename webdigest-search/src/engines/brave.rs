//! Brave Web Search API provider.
//!
//! Uses the JSON endpoint at `/res/v1/web/search`, authenticated with an
//! `X-Subscription-Token` header. Each round requests up to
//! [`SearchConfig::count`] results with a `newer_than:<N>d` recency hint.

use scraper::Html;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::engine::SearchProvider;
use crate::error::SearchError;
use crate::http;
use crate::timestamp::normalize_published;
use crate::types::SearchResult;

/// Path of the web search endpoint relative to the configured base URL.
const WEB_SEARCH_PATH: &str = "/res/v1/web/search";

/// Brave Search API client.
pub struct BraveSearch {
    config: SearchConfig,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BraveSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearch")
            .field("base_url", &self.config.base_url)
            .field("count", &self.config.count)
            .field("strict", &self.config.strict)
            .finish_non_exhaustive()
    }
}

impl BraveSearch {
    /// Create a Brave client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the key is blank or the config is
    /// invalid, and [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::Config(
                "Brave API key is not set (BRAVE_API_KEY)".into(),
            ));
        }
        config.validate()?;
        let client = http::build_client(&config)?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Query string sent to the API, including the recency hint.
    fn provider_query(&self, query: &str) -> String {
        format!("{} newer_than:{}d", query.trim(), self.config.recency_days)
    }
}

impl SearchProvider for BraveSearch {
    async fn search(
        &self,
        query: &str,
        round_index: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::trace!(query, round_index, "Brave search");

        let url = format!(
            "{}{WEB_SEARCH_PATH}",
            self.config.base_url.trim_end_matches('/')
        );
        let q = self.provider_query(query);
        let count = self.config.count.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("count", count.as_str()),
                ("safesearch", self.config.safe_search_level()),
            ])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| http::map_send_error("Brave request failed", e))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("Brave HTTP error: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Brave response is not JSON: {e}")))?;

        let results = parse_brave_response(&body)?;
        tracing::debug!(round_index, count = results.len(), "Brave round complete");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "Brave"
    }
}

/// Map a Brave API response body into search results.
///
/// Extracted as a separate function for testability with canned JSON.
/// A body without a `web` section means zero hits, not an error.
pub(crate) fn parse_brave_response(body: &Value) -> Result<Vec<SearchResult>, SearchError> {
    if !body.is_object() {
        return Err(SearchError::Parse("Brave response is not an object".into()));
    }

    let Some(items) = body
        .get("web")
        .and_then(|web| web.get("results"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let results = items
        .iter()
        .filter_map(|item| {
            let url = item.get("url").and_then(Value::as_str)?.trim();
            if url.is_empty() {
                return None;
            }
            let text = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .map(strip_markup)
                    .unwrap_or_default()
            };
            Some(SearchResult {
                title: text("title"),
                url: url.to_owned(),
                snippet: text("description"),
                published_at: published_field(item).and_then(normalize_published),
                source: item
                    .get("meta_url")
                    .and_then(|m| m.get("hostname"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })
        })
        .collect();

    Ok(results)
}

/// Locate the most specific publication field Brave supplied.
///
/// Preference: `age.published`, then `page_age`, then `meta_url.lastmod`.
/// A free-text `age` string ("2 days ago") is not a timestamp.
fn published_field(item: &Value) -> Option<&Value> {
    item.get("age")
        .and_then(|age| age.get("published"))
        .or_else(|| item.get("page_age"))
        .or_else(|| item.get("meta_url").and_then(|m| m.get("lastmod")))
        .filter(|v| !v.is_null())
}

/// Remove inline markup (`<strong>`, entities) from provider text.
fn strip_markup(raw: &str) -> String {
    if !raw.contains('<') && !raw.contains('&') {
        return raw.trim().to_owned();
    }
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_owned()
}
