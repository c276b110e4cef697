//! Progress events for a digest run.
//!
//! Callback-based reporting keeps the pipeline independent of how progress is
//! shown (CLI status lines, logs, tests).

use std::fmt;

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// Round-one search for the topic.
    Seed,
    /// Model-driven query expansion.
    Expand,
    /// Follow-up search rounds.
    Broaden,
    /// Concatenating rounds.
    Merge,
    /// Dedupe, recency filter and truncation.
    Clean,
    /// Per-source summarisation.
    Enrich,
    /// Scoring and ordering.
    Rank,
    /// Digest synthesis.
    Synthesize,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Seed => "seed",
            Self::Expand => "expand",
            Self::Broaden => "broaden",
            Self::Merge => "merge",
            Self::Clean => "clean",
            Self::Enrich => "enrich",
            Self::Rank => "rank",
            Self::Synthesize => "synthesize",
        };
        f.write_str(label)
    }
}

/// A progress event emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A stage has started.
    StageStarted {
        /// The stage.
        stage: RunStage,
    },
    /// A search round returned.
    RoundCompleted {
        /// 1-based round index.
        round: usize,
        /// Results the round produced.
        results: usize,
    },
    /// Follow-up queries were derived.
    QueriesExpanded {
        /// The queries, in the order they will be searched.
        queries: Vec<String>,
    },
    /// Cleaning finished.
    Cleaned {
        /// Results before deduplication.
        merged: usize,
        /// Results after deduplication.
        unique: usize,
        /// Results inside the recency window.
        recent: usize,
        /// Results kept after truncation.
        kept: usize,
    },
    /// One source was summarised.
    SourceSummarized {
        /// Sources summarised so far.
        done: usize,
        /// Sources to summarise.
        total: usize,
    },
    /// The digest is ready.
    Completed {
        /// Number of cited sources.
        sources: usize,
    },
}

/// Callback for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(RunEvent) + Send + Sync>;
