//! Trait definition for pluggable search providers.
//!
//! The aggregation pipeline only depends on [`SearchProvider`]; the Brave
//! API client, offline demo providers, and test mocks all implement it.

use crate::error::SearchError;
use crate::types::SearchResult;

/// A search collaborator that answers one query per round.
///
/// Implementors are responsible for:
///
/// - URL construction with query encoding
/// - HTTP request with appropriate headers and credentials
/// - Mapping provider-specific fields to [`SearchResult`], normalising
///   `published_at` where derivable
///
/// All implementations must be `Send + Sync` so rounds can be fanned out
/// concurrently.
pub trait SearchProvider: Send + Sync {
    /// Run one search round.
    ///
    /// # Arguments
    ///
    /// * `query` — The query string (encoding is handled by the implementation).
    /// * `round_index` — 1 for the seed round, 2.. for broadening rounds.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the request fails, the response cannot be
    /// parsed, or the provider rejects the request.
    fn search(
        &self,
        query: &str,
        round_index: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, SearchError>> + Send;

    /// Human-readable provider name used in logs.
    fn name(&self) -> &'static str;
}
