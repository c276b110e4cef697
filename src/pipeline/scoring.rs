//! Relevance scoring and ranking of summaries.
//!
//! ```text
//! score = 0.6 * freshness + 0.3 * density + 0.1 * host_bonus
//! ```
//!
//! - `freshness` decays linearly from 1.0 to 0.0 over 90 whole days of age
//!   (future timestamps count as age 0). Absent or unparseable timestamps get
//!   0.2 rather than 0.
//! - `density` is the insight count over 5, saturating at 1.0.
//! - `host_bonus` is 0.1 for `https://` URLs, else 0.0.
//!
//! Scores are a pure function of the summary and the evaluation instant.
//! They are never stored on the summary.

use chrono::{DateTime, Utc};
use webdigest_search::timestamp::parse_timestamp;
use webdigest_search::url_normalize::is_secure;

use crate::types::{ScoredItem, Summary};

/// Weight of the freshness component.
pub const FRESHNESS_WEIGHT: f64 = 0.6;
/// Weight of the density component.
pub const DENSITY_WEIGHT: f64 = 0.3;
/// Weight of the host bonus component.
pub const HOST_WEIGHT: f64 = 0.1;

/// Days over which freshness decays to zero.
pub const FRESHNESS_HORIZON_DAYS: f64 = 90.0;
/// Freshness used when the timestamp is missing or unparseable.
pub const UNKNOWN_FRESHNESS: f64 = 0.2;
/// Insight count at which density saturates.
pub const DENSITY_SATURATION: f64 = 5.0;
/// Bonus for secure URLs.
pub const SECURE_HOST_BONUS: f64 = 0.1;

/// Freshness component for a `published_at` value.
pub fn freshness(published_at: Option<&str>, now: DateTime<Utc>) -> f64 {
    let Some(published) = published_at.and_then(parse_timestamp) else {
        return UNKNOWN_FRESHNESS;
    };
    let age_days = (now - published).num_days().max(0) as f64;
    (1.0 - age_days / FRESHNESS_HORIZON_DAYS).max(0.0)
}

/// Density component for an insight count.
pub fn density(insight_count: usize) -> f64 {
    (insight_count as f64 / DENSITY_SATURATION).min(1.0)
}

/// Host bonus component for a URL.
pub fn host_bonus(url: &str) -> f64 {
    if is_secure(url) {
        SECURE_HOST_BONUS
    } else {
        0.0
    }
}

/// Relevance score in `[0, 1]`.
pub fn score(item: &Summary, now: DateTime<Utc>) -> f64 {
    FRESHNESS_WEIGHT * freshness(item.published_at.as_deref(), now)
        + DENSITY_WEIGHT * density(item.insights.len())
        + HOST_WEIGHT * host_bonus(&item.url)
}

/// Score every item and order descending. Equal scores keep input order.
pub fn rank_scored(items: &[Summary], now: DateTime<Utc>) -> Vec<ScoredItem<'_>> {
    let mut scored: Vec<ScoredItem<'_>> = items
        .iter()
        .map(|item| ScoredItem {
            item,
            score: score(item, now),
        })
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Order summaries by descending score. Equal scores keep input order.
pub fn rank(items: Vec<Summary>, now: DateTime<Utc>) -> Vec<Summary> {
    let mut keyed: Vec<(f64, Summary)> = items
        .into_iter()
        .map(|item| (score(&item, now), item))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, item)| item).collect()
}
