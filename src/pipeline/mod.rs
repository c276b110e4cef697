//! The aggregation pipeline.
//!
//! Pure stages (dedup, recency, scoring) are plain functions over owned
//! vectors. Stages that call the model collaborator (expansion,
//! summarisation, digest) are small structs holding an
//! `Arc<dyn ModelClient>`. [`coordinator::Aggregator`] wires them together.

pub mod coordinator;
pub mod dedup;
pub mod digest;
pub mod expand;
pub mod prompts;
pub mod recency;
pub mod scoring;
pub mod summarize;

pub use coordinator::{Aggregator, RunOutcome};
pub use dedup::{DedupKey, dedupe};
pub use digest::DigestSynthesizer;
pub use expand::{Expansion, MAX_EXPANDED_QUERIES, QueryExpander};
pub use recency::{Published, RecencyFilter, filter_recent, is_recent};
pub use scoring::{rank, rank_scored, score};
pub use summarize::{HttpPageFetcher, OfflineFetcher, PageFetcher, Summarizer};
