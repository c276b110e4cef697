//! Page fetching and readable-text extraction.
//!
//! Summaries are grounded on the text of each source page. Pages are
//! downloaded with the shared HTTP client, boilerplate elements (scripts,
//! navigation, footers, ...) are skipped, and the main content area is
//! flattened into whitespace-normalised text capped at a character budget.

use scraper::{ElementRef, Html, Selector};

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::http;
use crate::types::PageContent;

/// Default maximum characters kept from a page.
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Elements whose text never counts as page content.
const BOILERPLATE: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
];

/// Content roots tried in priority order.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

/// Most bytes of a response body read before extraction.
pub const MAX_PAGE_BYTES: usize = 1024 * 1024;

/// Reusable page downloader holding one HTTP client.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: reqwest::Client,
    max_bytes: usize,
}

impl PageClient {
    /// Build the client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config)?,
            max_bytes: MAX_PAGE_BYTES,
        })
    }

    /// Override the body read limit.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download a page and extract its readable text.
    ///
    /// At most `max_bytes` of the body are read; the rest is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`]/[`SearchError::Timeout`] if the page
    /// cannot be fetched, or [`SearchError::Parse`] if it has no extractable
    /// text.
    pub async fn fetch(&self, url: &str, max_chars: usize) -> Result<PageContent> {
        tracing::trace!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,text/plain;q=0.9")
            .send()
            .await
            .map_err(|e| http::map_send_error("page request failed", e))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("page HTTP error: {e}")))?;

        let is_plain_text = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/plain"));

        let body = read_capped(response, self.max_bytes).await?;
        tracing::trace!(bytes = body.len(), "page received");

        if is_plain_text {
            let text = truncate_chars(&normalise_whitespace(&body), max_chars);
            if text.is_empty() {
                return Err(SearchError::Parse("no extractable content found".into()));
            }
            return Ok(PageContent {
                url: url.to_owned(),
                title: String::new(),
                word_count: text.split_whitespace().count(),
                text,
            });
        }

        extract_content(&body, url, max_chars)
    }
}

/// Download a page with a one-off client and extract its readable text.
///
/// Prefer [`PageClient`] when fetching more than one page.
///
/// # Errors
///
/// See [`PageClient::fetch`].
pub async fn fetch_page_content(
    url: &str,
    config: &SearchConfig,
    max_chars: usize,
) -> Result<PageContent> {
    PageClient::new(config)?.fetch(url, max_chars).await
}

/// Read the body chunk by chunk, stopping after `limit` bytes.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SearchError::Http(format!("page read failed: {e}")))?
    {
        let room = limit.saturating_sub(bytes.len());
        if chunk.len() > room {
            bytes.extend_from_slice(&chunk[..room]);
            tracing::debug!(limit, "page body truncated");
            break;
        }
        bytes.extend_from_slice(&chunk);
    }
    // A cut may split a multi-byte character; the lossy decode drops it.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract readable text content from raw HTML.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_content(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let title = page_title(&document);
    let text = normalise_whitespace(&main_text(&document));
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable content found".into()));
    }

    let text = truncate_chars(&text, max_chars);
    let word_count = text.split_whitespace().count();

    Ok(PageContent {
        url: url.to_owned(),
        title,
        text,
        word_count,
    })
}

fn page_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| normalise_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Text of the first non-empty content root, skipping boilerplate subtrees.
fn main_text(document: &Html) -> String {
    for root in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(root) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| BOILERPLATE.contains(&el.name()))
        });
        if !in_boilerplate {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// Collapse every whitespace run into a single space.
fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_owned(),
        None => text.to_owned(),
    }
}
