//! Recency filtering.
//!
//! Unlike scoring, which tolerates missing timestamps, the filter drops any
//! item whose `published_at` is absent, unparseable, in the future, or older
//! than the window. The window bound is inclusive.

use chrono::{DateTime, Duration, Utc};
use webdigest_search::SearchResult;
use webdigest_search::timestamp::parse_timestamp;
use webdigest_search::url_normalize::web_host;

use crate::types::Summary;

/// Items carrying a publication time and URL.
pub trait Published {
    /// Raw `published_at` value.
    fn published_at(&self) -> Option<&str>;
    /// Item URL.
    fn url(&self) -> &str;
}

impl Published for SearchResult {
    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl Published for Summary {
    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Whether `published_at` falls in `[now - window_days, now]`.
pub fn is_recent(published_at: Option<&str>, window_days: u32, now: DateTime<Utc>) -> bool {
    let Some(published) = published_at.and_then(parse_timestamp) else {
        return false;
    };
    let age = now - published;
    age >= Duration::zero() && age <= Duration::days(i64::from(window_days))
}

/// Keep items published within the last `window_days`, preserving order.
pub fn filter_recent<T: Published>(items: Vec<T>, window_days: u32, now: DateTime<Utc>) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| {
            let keep = is_recent(item.published_at(), window_days, now);
            if !keep {
                tracing::debug!(url = item.url(), published_at = ?item.published_at(), "dropped by recency window");
            }
            keep
        })
        .collect()
}

/// Recency filter with an optional strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyFilter {
    /// Window length in days.
    pub window_days: u32,
    /// Also drop items whose URL is not an absolute `http(s)` URL with a host.
    pub strict: bool,
}

impl RecencyFilter {
    /// Create a filter.
    pub fn new(window_days: u32, strict: bool) -> Self {
        Self {
            window_days,
            strict,
        }
    }

    /// Apply the filter, preserving order.
    pub fn apply<T: Published>(&self, items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
        let recent = filter_recent(items, self.window_days, now);
        if !self.strict {
            return recent;
        }
        recent
            .into_iter()
            .filter(|item| {
                let web = web_host(item.url()).is_some();
                if !web {
                    tracing::debug!(url = item.url(), "dropped non-web URL in strict mode");
                }
                web
            })
            .collect()
    }
}
