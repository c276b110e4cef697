//! # webdigest-search
//!
//! The search collaborator boundary for WebDigest.
//!
//! This crate owns everything that talks to the outside web on behalf of the
//! aggregation pipeline: typed [`SearchResult`] records, the
//! [`SearchProvider`] trait, a Brave Search API client, and page text
//! extraction used when summarising sources.
//!
//! ## Design
//!
//! - Provider-specific fields are mapped into typed results at the boundary;
//!   timestamps are normalised to RFC 3339 where derivable and left absent
//!   otherwise, never guessed
//! - Credentials are passed to constructors explicitly; nothing here reads
//!   the environment
//! - One HTTP client per provider, with request timeouts from
//!   [`SearchConfig`]
//!
//! ## Security
//!
//! - API keys never appear in `Debug` output or error messages
//! - Queries are logged only at trace level
//! - Provider markup is stripped from titles and snippets

pub mod config;
pub mod content;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod timestamp;
pub mod types;
pub mod url_normalize;

pub use config::SearchConfig;
pub use content::{fetch_page_content, PageClient};
pub use engine::SearchProvider;
pub use engines::BraveSearch;
pub use error::{Result, SearchError};
pub use types::{PageContent, SearchResult};
