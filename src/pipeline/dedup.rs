//! Deduplication by (title, canonical URL).
//!
//! Two items are duplicates when their trimmed, lowercased titles match and
//! their URLs match once any `#fragment` is removed. The first occurrence
//! wins; later duplicates are dropped without merging any of their fields.
//!
//! Missing titles and URLs key as empty strings, so two items lacking both
//! collapse into one.

use std::collections::HashSet;

use webdigest_search::SearchResult;
use webdigest_search::url_normalize::canonical_url;

use crate::types::Summary;

/// Items that can be deduplicated.
pub trait DedupKey {
    /// Title used for keying.
    fn dedup_title(&self) -> &str;
    /// URL used for keying.
    fn dedup_url(&self) -> &str;

    /// The `(normalised title, canonical URL)` key.
    fn dedup_key(&self) -> (String, String) {
        (
            self.dedup_title().trim().to_lowercase(),
            canonical_url(self.dedup_url()).to_owned(),
        )
    }
}

impl DedupKey for SearchResult {
    fn dedup_title(&self) -> &str {
        &self.title
    }

    fn dedup_url(&self) -> &str {
        &self.url
    }
}

impl DedupKey for Summary {
    fn dedup_title(&self) -> &str {
        &self.title
    }

    fn dedup_url(&self) -> &str {
        &self.url
    }
}

/// Drop items whose key has already been seen, preserving order.
pub fn dedupe<T: DedupKey>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}
