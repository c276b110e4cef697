//! Markdown rendering and export of a finished digest.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{DigestReport, Summary};

/// `[title](url) — published_at` for one source.
pub fn source_line(source: &Summary) -> String {
    let title = if source.title.trim().is_empty() {
        "(untitled)"
    } else {
        source.title.as_str()
    };
    let url = if source.url.trim().is_empty() {
        "#"
    } else {
        source.url.as_str()
    };
    format!(
        "[{title}]({url}) — {}",
        source.published_at.as_deref().unwrap_or("")
    )
}

/// The cited sources as a Markdown bullet list, in rank order.
pub fn sources_markdown(sources: &[Summary]) -> String {
    sources
        .iter()
        .map(|s| format!("- {}\n", source_line(s)))
        .collect()
}

/// The digest followed by its cited sources.
pub fn render_markdown(report: &DigestReport) -> String {
    format!(
        "{}\n\n## Cited sources\n\n{}",
        report.digest.trim_end(),
        sources_markdown(&report.sources)
    )
}

/// `webdigest_<topic>.md`, with characters unsafe in file names replaced.
pub fn export_file_name(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.trim().chars() {
        if c.is_alphanumeric() || c == '-' {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "digest" } else { slug };
    format!("webdigest_{slug}.md")
}

/// Write the rendered report into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an I/O error if the directory or file cannot be written.
pub fn write_markdown(dir: &Path, report: &DigestReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(&report.topic));
    fs::write(&path, render_markdown(report))?;
    tracing::info!(path = %path.display(), "digest written");
    Ok(path)
}
