//! Parsing of structured (JSON) completions.
//!
//! Models asked for JSON frequently wrap it in prose or code fences. Parsing
//! happens in two observable stages: a strict parse of the whole reply, then a
//! bracket scan for a top-level `{...}` block. When neither yields an object
//! the result is an empty map, never an error.

use serde_json::{Map, Value};

/// A JSON object returned by a structured completion.
pub type JsonMap = Map<String, Value>;

/// Which parse stage produced the value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The whole reply was a JSON object.
    Direct(JsonMap),
    /// A JSON object was recovered from surrounding text.
    Extracted(JsonMap),
    /// Nothing usable was found.
    Empty,
}

impl ParseOutcome {
    /// The parsed object, or an empty map.
    pub fn into_map(self) -> JsonMap {
        match self {
            Self::Direct(map) | Self::Extracted(map) => map,
            Self::Empty => JsonMap::new(),
        }
    }

    /// Short label for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Extracted(_) => "extracted",
            Self::Empty => "empty",
        }
    }
}

/// Parse a structured completion reply.
pub fn parse_structured(raw: &str) -> ParseOutcome {
    let trimmed = raw.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return ParseOutcome::Direct(map);
    }

    // Prefer the last block: models tend to put the answer after any preamble.
    for block in object_blocks(trimmed).into_iter().rev() {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(block) {
            return ParseOutcome::Extracted(map);
        }
    }

    ParseOutcome::Empty
}

/// Every balanced top-level `{...}` span in `text`, in order.
///
/// Braces inside JSON string literals are ignored. A `{` that is never
/// closed is treated as prose and scanning resumes just after it.
fn object_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut from = 0usize;
    while let Some(unclosed) = scan_blocks(text, from, &mut blocks) {
        from = unclosed + 1;
    }
    blocks
}

/// Scan `text[from..]`, pushing closed blocks. Returns the byte offset of an
/// opening brace still unclosed at the end of the text.
fn scan_blocks<'a>(text: &'a str, from: usize, blocks: &mut Vec<&'a str>) -> Option<usize> {
    let mut depth = 0usize;
    let mut start = from;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[from..].char_indices() {
        let idx = from + offset;
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    blocks.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    (depth > 0).then_some(start)
}

/// Keep the string entries of a JSON array field, skipping blanks.
pub fn string_list(map: &JsonMap, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// A trimmed, non-empty string field.
pub fn string_field(map: &JsonMap, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
