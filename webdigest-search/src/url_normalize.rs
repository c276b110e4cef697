//! URL helpers shared by deduplication, filtering, and scoring.
//!
//! The canonical form used for deduplication is deliberately minimal: only
//! the `#fragment` suffix is removed. Scheme, host case, ports, and query
//! parameters are left untouched so that two results are only collapsed when
//! they point at the same document section-agnostically.

use url::Url;

/// Strip any `#fragment` suffix from a URL.
///
/// Works on arbitrary strings, including ones that do not parse as URLs.
///
/// # Examples
///
/// ```
/// use webdigest_search::url_normalize::canonical_url;
///
/// assert_eq!(canonical_url("https://x.test/a#section"), "https://x.test/a");
/// assert_eq!(canonical_url("https://x.test/a"), "https://x.test/a");
/// assert_eq!(canonical_url(""), "");
/// ```
pub fn canonical_url(raw: &str) -> &str {
    match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Returns `true` if the URL uses the secure `https://` scheme.
pub fn is_secure(raw: &str) -> bool {
    raw.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
}

/// Lowercased hostname of an absolute `http`/`https` URL.
///
/// Returns `None` for relative URLs, other schemes, or unparseable input.
pub fn web_host(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_lowercase)
}
