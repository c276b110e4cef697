//! Topic and query sanitisation.
//!
//! Topics come from users and expanded queries come from a model; both end up
//! in search requests and prompts. Line breaks are flattened and characters
//! used for markup or shell interpolation are dropped.

/// Longest topic kept, in characters.
pub const MAX_TOPIC_CHARS: usize = 200;

/// Whitespace control characters replaced by a space.
const CONTROL_WHITESPACE: &[char] = &['\r', '\n', '\t'];

/// Characters removed outright.
const STRIPPED: &[char] = &['<', '>', '`', '$'];

/// Sanitise a topic or query string.
pub fn sanitize_topic(topic: &str) -> String {
    let cleaned: String = topic
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if CONTROL_WHITESPACE.contains(&c) { ' ' } else { c })
        .collect();
    cleaned.trim().chars().take(MAX_TOPIC_CHARS).collect()
}
