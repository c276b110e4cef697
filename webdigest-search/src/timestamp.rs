//! Publication timestamp parsing and normalisation.
//!
//! Providers report publication dates in many shapes: RFC 3339 strings,
//! naive ISO-8601 date-times, bare dates, or Unix epoch numbers. Results
//! carry a normalised RFC 3339 string when one is derivable; consumers parse
//! it back with [`parse_timestamp`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Naive date-time layouts accepted after RFC 3339 fails. Naive values are UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp string into UTC.
///
/// Accepts RFC 3339 (`2026-10-01T12:00:00Z`, `...+02:00`), naive date-times
/// (interpreted as UTC, with or without a trailing `Z`), and bare dates
/// (midnight UTC). Returns `None` for anything else.
///
/// ```
/// use webdigest_search::timestamp::parse_timestamp;
///
/// assert!(parse_timestamp("2026-10-01T12:00:00Z").is_some());
/// assert!(parse_timestamp("2026-10-01").is_some());
/// assert!(parse_timestamp("last tuesday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for layout in NAIVE_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, layout) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format a UTC instant the way results carry it.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalise a provider-supplied timestamp value.
///
/// - numbers are Unix epoch seconds;
/// - parseable strings are re-emitted as RFC 3339;
/// - unparseable non-empty strings are kept verbatim (not guessed);
/// - anything else, including empty strings, is `None`.
pub fn normalize_published(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            DateTime::<Utc>::from_timestamp(secs, 0).map(format_timestamp)
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(
                parse_timestamp(trimmed)
                    .map(format_timestamp)
                    .unwrap_or_else(|| trimmed.to_owned()),
            )
        }
        _ => None,
    }
}
