//! WebDigest: iterative web search to a cited one-page Markdown digest.
//!
//! A run takes a topic through a fixed sequence of stages:
//! Search → Expand → Broaden → Dedupe → Recency filter → Summarise → Rank → Digest
//!
//! # Architecture
//!
//! - **Search**: the [`webdigest_search::SearchProvider`] collaborator (Brave by default)
//! - **Model**: the [`llm::ModelClient`] collaborator (OpenAI or Anthropic)
//! - **Pipeline**: pure cleaning and ranking stages plus model-driven
//!   expansion, summarisation and synthesis, driven by
//!   [`pipeline::Aggregator`]
//!
//! Collaborators are injected, so the whole pipeline runs against mocks or
//! the offline [`demo`] implementations.

pub mod clock;
pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Credentials, DigestConfig, ModelProvider, PipelineConfig, RecencyWindow};
pub use error::{DigestError, ErrorKind, Result};
pub use llm::{ModelClient, ModelError, build_model_client};
pub use pipeline::{Aggregator, RunOutcome};
pub use progress::{ProgressCallback, RunEvent, RunStage};
pub use types::{DigestReport, ScoredItem, Summary};
