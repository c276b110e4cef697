//! Aggregation controller: drives one digest run from topic to Markdown.
//!
//! ```text
//! Seed ─► Expand ─► Broaden ─► Merge ─► Clean ─► Enrich ─► Rank ─► Synthesize
//! ```
//!
//! Follow-up rounds are issued concurrently but reassembled in round order,
//! so the merged pool (and therefore first-wins deduplication) is the same as
//! a sequential run. Every external call is bounded by the per-call timeout
//! and observes the run's cancellation token. Nothing is retried: the first
//! failure ends the run and no partial digest is produced.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use webdigest_search::{SearchProvider, SearchResult};

use super::dedup::dedupe;
use super::digest::DigestSynthesizer;
use super::expand::{MAX_EXPANDED_QUERIES, QueryExpander};
use super::recency::RecencyFilter;
use super::scoring::rank;
use super::summarize::{OfflineFetcher, PageFetcher, Summarizer};
use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::error::{DigestError, Result};
use crate::llm::ModelClient;
use crate::progress::{ProgressCallback, RunEvent, RunStage};
use crate::sanitize::sanitize_topic;
use crate::types::{DigestReport, Summary};

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The digest was produced.
    Completed(DigestReport),
    /// The run stopped at `stage`.
    Failed {
        /// Stage in progress when the run failed.
        stage: RunStage,
        /// Why it failed.
        error: DigestError,
    },
}

impl RunOutcome {
    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Convert into a `Result`, dropping the failed stage.
    ///
    /// # Errors
    ///
    /// Returns the run's error when it failed.
    pub fn into_result(self) -> Result<DigestReport> {
        match self {
            Self::Completed(report) => Ok(report),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

/// Drives search, expansion, cleaning, summarisation, ranking and synthesis.
pub struct Aggregator<S> {
    search: S,
    model: Arc<dyn ModelClient>,
    fetcher: Arc<dyn PageFetcher>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<S: SearchProvider> Aggregator<S> {
    /// Create an aggregator. Pages are not fetched unless a fetcher is set
    /// with [`Aggregator::with_fetcher`].
    pub fn new(search: S, model: Arc<dyn ModelClient>, config: PipelineConfig) -> Self {
        Self {
            search,
            model,
            fetcher: Arc::new(OfflineFetcher),
            clock: Arc::new(SystemClock),
            config,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Set the page fetcher used by the summariser.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Set the clock that supplies the evaluation instant.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use an externally owned cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Token that cancels the run when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline for `topic`.
    pub async fn run(&self, topic: &str) -> RunOutcome {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("digest_run", %run_id, provider = self.search.name());
        let mut stage = RunStage::Seed;

        let result = self.execute(topic, &mut stage).instrument(span).await;
        match result {
            Ok(report) => {
                tracing::info!(%run_id, sources = report.sources.len(), "digest run completed");
                RunOutcome::Completed(report)
            }
            Err(error) => {
                tracing::warn!(%run_id, %stage, %error, "digest run failed");
                RunOutcome::Failed { stage, error }
            }
        }
    }

    /// Run the pipeline, returning only the error on failure.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, collaborator, data or cancellation
    /// error encountered.
    pub async fn try_run(&self, topic: &str) -> Result<DigestReport> {
        self.run(topic).await.into_result()
    }

    async fn execute(&self, raw_topic: &str, stage: &mut RunStage) -> Result<DigestReport> {
        self.config.validate()?;
        let topic = sanitize_topic(raw_topic);
        if topic.is_empty() {
            return Err(DigestError::Config("topic is empty".into()));
        }
        let now = self.clock.now();

        self.enter(stage, RunStage::Seed);
        tracing::trace!(query = %topic, "seed round");
        let seed = self
            .guarded("search round 1", self.search.search(&topic, 1))
            .await?;
        self.emit(RunEvent::RoundCompleted {
            round: 1,
            results: seed.len(),
        });

        let mut issued = vec![topic.to_lowercase()];
        let mut rounds = vec![seed];

        if self.config.rounds >= 2 {
            let seeds = seed_lines(&rounds[0], self.config.seed_snippets);
            self.enter(stage, RunStage::Expand);
            let queries = self
                .expand(&topic, &seeds, MAX_EXPANDED_QUERIES, &mut issued)
                .await?;

            self.enter(stage, RunStage::Broaden);
            let broadened = self.broaden(&queries, 2).await?;

            let remaining = MAX_EXPANDED_QUERIES.saturating_sub(queries.len());
            let followups = if self.config.rounds >= 3 && remaining > 0 {
                let pool: Vec<SearchResult> = broadened.iter().flatten().cloned().collect();
                let seeds = seed_lines(&pool, self.config.seed_snippets);
                if seeds.is_empty() {
                    Vec::new()
                } else {
                    self.enter(stage, RunStage::Expand);
                    let more = self.expand(&topic, &seeds, remaining, &mut issued).await?;
                    self.enter(stage, RunStage::Broaden);
                    self.broaden(&more, 2 + queries.len()).await?
                }
            } else {
                Vec::new()
            };

            rounds.extend(broadened);
            rounds.extend(followups);
        }

        self.enter(stage, RunStage::Merge);
        let merged: Vec<SearchResult> = rounds.into_iter().flatten().collect();

        self.enter(stage, RunStage::Clean);
        let kept = self.clean(merged, now)?;

        self.enter(stage, RunStage::Enrich);
        let summaries = self.enrich(&kept).await?;

        self.enter(stage, RunStage::Rank);
        let ranked = rank(summaries, now);

        self.enter(stage, RunStage::Synthesize);
        let synthesizer =
            DigestSynthesizer::new(Arc::clone(&self.model)).with_max_tokens(self.config.digest_max_tokens);
        let digest = self
            .guarded("digest synthesis", synthesizer.synthesize(&topic, &ranked))
            .await?;

        self.emit(RunEvent::Completed {
            sources: ranked.len(),
        });
        Ok(DigestReport {
            topic,
            digest,
            sources: ranked,
        })
    }

    /// Ask for follow-up queries and drop ones already searched.
    async fn expand(
        &self,
        topic: &str,
        seeds: &[String],
        limit: usize,
        issued: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let expander = QueryExpander::new(Arc::clone(&self.model)).with_limit(limit);
        let expansion = self
            .guarded("query expansion", expander.expand(topic, seeds))
            .await?;

        let mut queries = Vec::with_capacity(expansion.queries.len());
        for query in expansion.queries {
            let query = if self.config.strict {
                sanitize_topic(&query)
            } else {
                query
            };
            let key = query.to_lowercase();
            if query.is_empty() || issued.contains(&key) {
                continue;
            }
            issued.push(key);
            queries.push(query);
        }

        tracing::debug!(queries = queries.len(), "follow-up queries ready");
        self.emit(RunEvent::QueriesExpanded {
            queries: queries.clone(),
        });
        Ok(queries)
    }

    /// Search every query concurrently; results come back in query order.
    async fn broaden(&self, queries: &[String], first_round: usize) -> Result<Vec<Vec<SearchResult>>> {
        let searches = queries.iter().enumerate().map(|(offset, query)| {
            let round = first_round + offset;
            async move {
                tracing::trace!(round, %query, "broadening round");
                let results = self
                    .guarded("search round", self.search.search(query, round))
                    .await?;
                self.emit(RunEvent::RoundCompleted {
                    round,
                    results: results.len(),
                });
                Ok::<_, DigestError>(results)
            }
        });
        try_join_all(searches).await
    }

    /// Dedupe, filter by recency, then truncate.
    fn clean(&self, merged: Vec<SearchResult>, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<SearchResult>> {
        let merged_len = merged.len();
        let unique = dedupe(merged);
        let unique_len = unique.len();
        let filter = RecencyFilter::new(self.config.recency_days.days(), self.config.strict);
        let mut kept = filter.apply(unique, now);
        let recent_len = kept.len();
        kept.truncate(self.config.max_sources);

        tracing::info!(
            merged = merged_len,
            unique = unique_len,
            recent = recent_len,
            kept = kept.len(),
            "candidate pool cleaned"
        );
        self.emit(RunEvent::Cleaned {
            merged: merged_len,
            unique: unique_len,
            recent: recent_len,
            kept: kept.len(),
        });

        if kept.is_empty() {
            return Err(DigestError::NoRecentResults {
                window_days: self.config.recency_days.days(),
            });
        }
        Ok(kept)
    }

    /// Summarise every result with bounded concurrency, preserving order.
    async fn enrich(&self, kept: &[SearchResult]) -> Result<Vec<Summary>> {
        let summarizer = Summarizer::new(
            Arc::clone(&self.model),
            Arc::clone(&self.fetcher),
            self.config.page_text_chars,
        );
        let summarizer = &summarizer;
        let total = kept.len();

        let mut stream = pin!(
            futures_util::stream::iter(kept)
                .map(|result| self.guarded("source summary", summarizer.summarize(result)))
                .buffered(self.config.summarize_concurrency.max(1))
        );

        let mut summaries = Vec::with_capacity(total);
        while let Some(summary) = stream.next().await {
            summaries.push(summary?);
            self.emit(RunEvent::SourceSummarized {
                done: summaries.len(),
                total,
            });
        }
        Ok(summaries)
    }

    /// Bound `fut` by the per-call timeout and the run's cancellation token.
    async fn guarded<T, E, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        DigestError: From<E>,
    {
        let secs = self.config.call_timeout_seconds;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DigestError::Cancelled),
            outcome = tokio::time::timeout(Duration::from_secs(secs), fut) => match outcome {
                Ok(inner) => inner.map_err(DigestError::from),
                Err(_) => Err(DigestError::Timeout(format!("{what} exceeded {secs}s"))),
            },
        }
    }

    fn enter(&self, stage: &mut RunStage, next: RunStage) {
        *stage = next;
        tracing::debug!(stage = %next, "stage started");
        self.emit(RunEvent::StageStarted { stage: next });
    }

    fn emit(&self, event: RunEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }
}

/// `"title — snippet"` lines for the first `limit` results.
fn seed_lines(results: &[SearchResult], limit: usize) -> Vec<String> {
    results.iter().take(limit).map(SearchResult::seed_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::RecencyWindow;
    use crate::llm::ModelError;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use webdigest_search::SearchError;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn days_ago(days: i64) -> String {
        (now() - ChronoDuration::days(days)).to_rfc3339()
    }

    fn hit(title: &str, url: &str, age_days: i64) -> SearchResult {
        SearchResult::new(title, url, format!("{title} snippet")).with_published_at(days_ago(age_days))
    }

    /// Search mock answering from a query → results table.
    #[derive(Default)]
    struct TableSearch {
        answers: HashMap<String, Vec<SearchResult>>,
        calls: Mutex<Vec<(String, usize)>>,
        fail_on: Option<String>,
        delay_first_followup: bool,
    }

    impl TableSearch {
        fn answer(mut self, query: &str, results: Vec<SearchResult>) -> Self {
            self.answers.insert(query.to_owned(), results);
            self
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl SearchProvider for TableSearch {
        async fn search(
            &self,
            query: &str,
            round_index: usize,
        ) -> std::result::Result<Vec<SearchResult>, SearchError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((query.to_owned(), round_index));
            }
            if self.delay_first_followup && round_index == 2 {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            if self.fail_on.as_deref() == Some(query) {
                return Err(SearchError::Http("HTTP 500".into()));
            }
            Ok(self.answers.get(query).cloned().unwrap_or_default())
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    /// Model mock routing on prompt content.
    struct RoutedModel {
        expansions: Mutex<Vec<String>>,
        insights_for: HashMap<String, usize>,
        digest_calls: Mutex<usize>,
        fail_digest: bool,
        slow_title: Option<String>,
    }

    impl RoutedModel {
        fn new(expansions: &[&str]) -> Self {
            Self {
                expansions: Mutex::new(expansions.iter().rev().map(|s| (*s).to_owned()).collect()),
                insights_for: HashMap::new(),
                digest_calls: Mutex::new(0),
                fail_digest: false,
                slow_title: None,
            }
        }
    }

    #[async_trait]
    impl ModelClient for RoutedModel {
        fn name(&self) -> &str {
            "routed"
        }

        async fn complete_text(&self, prompt: &str, _max_tokens: u32) -> std::result::Result<String, ModelError> {
            if prompt.contains("follow-up web search queries") {
                let next = self.expansions.lock().ok().and_then(|mut e| e.pop());
                return Ok(next.unwrap_or_else(|| "{}".into()));
            }
            if prompt.contains("Summarise the following web page") {
                if let Some(slow) = &self.slow_title
                    && prompt.contains(&format!("Title: {slow}\n"))
                {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
                let count = self
                    .insights_for
                    .iter()
                    .find(|(title, _)| prompt.contains(&format!("Title: {title}\n")))
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                let insights: Vec<String> = (0..count).map(|i| format!("insight {i}")).collect();
                return Ok(serde_json::json!({"summary": "s", "insights": insights}).to_string());
            }
            if let Ok(mut calls) = self.digest_calls.lock() {
                *calls += 1;
            }
            if self.fail_digest {
                return Err(ModelError::ProviderError("HTTP 503".into()));
            }
            Ok("# Digest".into())
        }
    }

    fn config(rounds: u8) -> PipelineConfig {
        PipelineConfig {
            rounds,
            recency_days: RecencyWindow::try_from(30).expect("allowed"),
            max_sources: 5,
            ..Default::default()
        }
    }

    impl RoutedModel {
        fn digest_calls(&self) -> usize {
            self.digest_calls.lock().map(|c| *c).unwrap_or(0)
        }

        fn expansions_left(&self) -> usize {
            self.expansions.lock().map(|e| e.len()).unwrap_or(0)
        }
    }

    fn aggregator<S: SearchProvider>(
        search: S,
        model: RoutedModel,
        config: PipelineConfig,
    ) -> (Aggregator<S>, Arc<RoutedModel>) {
        let model = Arc::new(model);
        let agg = Aggregator::new(search, model.clone(), config).with_clock(Arc::new(FixedClock(now())));
        (agg, model)
    }

    #[tokio::test]
    async fn full_run_merges_in_round_order_and_dedupes() {
        let search = TableSearch::default()
            .answer("vector databases", vec![hit("A", "https://x.test/a", 1), hit("B", "https://x.test/b", 2)])
            .answer("q1", vec![hit("a", "https://x.test/a#dup", 1), hit("C", "https://x.test/c", 3)])
            .answer("q2", vec![hit("D", "https://x.test/d", 4)]);
        let model = RoutedModel::new(&[r#"{"queries": ["q1", "q2"]}"#]);
        let (agg, _) = aggregator(search, model, config(2));

        let report = agg.try_run("vector databases").await.expect("run completes");
        assert_eq!(report.digest, "# Digest");
        let mut urls: Vec<_> = report.sources.iter().map(|s| s.url.clone()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec!["https://x.test/a", "https://x.test/b", "https://x.test/c", "https://x.test/d"]
        );
        assert_eq!(
            agg.search.calls(),
            vec![
                ("vector databases".to_owned(), 1),
                ("q1".to_owned(), 2),
                ("q2".to_owned(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_rounds_reassembled_in_order() {
        let search = TableSearch {
            delay_first_followup: true,
            ..Default::default()
        }
        .answer("topic", vec![])
        .answer("slow", vec![hit("Same", "https://x.test/same", 1)])
        .answer("fast", vec![hit("Same", "https://x.test/same#later", 1)]);
        let model = RoutedModel::new(&[r#"{"queries": ["slow", "fast"]}"#]);
        let (agg, _) = aggregator(search, model, config(2));

        let report = agg.try_run("topic").await.expect("run completes");
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].url, "https://x.test/same");
    }

    #[tokio::test]
    async fn single_round_skips_expansion() {
        let search = TableSearch::default().answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let model = RoutedModel::new(&[r#"{"queries": ["never"]}"#]);
        let (agg, model) = aggregator(search, model, config(1));

        agg.try_run("topic").await.expect("run completes");
        assert_eq!(agg.search.calls().len(), 1);
        assert_eq!(model.expansions_left(), 1);
    }

    #[tokio::test]
    async fn three_rounds_expand_twice_within_budget() {
        let search = TableSearch::default()
            .answer("topic", vec![hit("A", "https://x.test/a", 1)])
            .answer("q1", vec![hit("B", "https://x.test/b", 1)])
            .answer("q2", vec![hit("C", "https://x.test/c", 1)]);
        let model = RoutedModel::new(&[
            r#"{"queries": ["q1", "q2"]}"#,
            r#"{"queries": ["Q1", "topic", "r1", "r2", "r3", "r4"]}"#,
        ]);
        let (agg, _) = aggregator(search, model, config(3));

        agg.try_run("topic").await.expect("run completes");
        let calls = agg.search.calls();
        let queries: Vec<_> = calls.iter().map(|(q, _)| q.as_str()).collect();
        // Second pass may add at most 3; "Q1" and "topic" were already issued.
        assert_eq!(queries, vec!["topic", "q1", "q2", "r1"]);
        assert!(calls.len() <= 1 + MAX_EXPANDED_QUERIES);
        assert_eq!(calls[3].1, 4);
    }

    #[tokio::test]
    async fn stale_pool_fails_without_digest() {
        let search = TableSearch::default().answer(
            "topic",
            vec![hit("Old", "https://x.test/old", 120), SearchResult::new("Undated", "https://x.test/u", "")],
        );
        let model = RoutedModel::new(&[]);
        let (agg, model) = aggregator(search, model, config(2));

        match agg.run("topic").await {
            RunOutcome::Failed { stage, error } => {
                assert_eq!(stage, RunStage::Clean);
                assert!(matches!(error, DigestError::NoRecentResults { window_days: 30 }));
            }
            RunOutcome::Completed(_) => panic!("stale pool must not complete"),
        }
        assert_eq!(model.digest_calls(), 0);
    }

    #[tokio::test]
    async fn truncation_happens_after_filtering() {
        let mut seed: Vec<_> = (0..6).map(|i| hit(&format!("old{i}"), &format!("https://x.test/o{i}"), 200)).collect();
        seed.extend((0..6).map(|i| hit(&format!("new{i}"), &format!("https://x.test/n{i}"), 1)));
        let search = TableSearch::default().answer("topic", seed);
        let (agg, _) = aggregator(search, RoutedModel::new(&[]), config(1));

        let report = agg.try_run("topic").await.expect("run completes");
        assert_eq!(report.sources.len(), 5);
        assert!(report.sources.iter().all(|s| s.title.starts_with("new")));
    }

    #[tokio::test]
    async fn ranking_uses_insight_density() {
        let search = TableSearch::default().answer(
            "topic",
            vec![hit("A", "https://x.test/a", 2), hit("B", "https://x.test/b", 2), hit("C", "https://x.test/c", 2)],
        );
        let mut model = RoutedModel::new(&[]);
        model.insights_for = HashMap::from([("A".to_owned(), 2), ("B".to_owned(), 0), ("C".to_owned(), 5)]);
        let (agg, _) = aggregator(search, model, config(1));

        let report = agg.try_run("topic").await.expect("run completes");
        let titles: Vec<_> = report.sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn summaries_keep_search_order_when_first_is_slow() {
        let search = TableSearch::default().answer(
            "topic",
            vec![hit("A", "https://x.test/a", 2), hit("B", "https://x.test/b", 2), hit("C", "https://x.test/c", 2)],
        );
        let mut model = RoutedModel::new(&[]);
        model.slow_title = Some("A".to_owned());
        let cfg = PipelineConfig {
            summarize_concurrency: 3,
            ..config(1)
        };
        let (agg, _) = aggregator(search, model, cfg);

        let report = agg.try_run("topic").await.expect("run completes");
        let titles: Vec<_> = report.sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn search_failure_aborts_at_broaden() {
        let search = TableSearch {
            fail_on: Some("q2".into()),
            ..Default::default()
        }
        .answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let model = RoutedModel::new(&[r#"{"queries": ["q1", "q2"]}"#]);
        let (agg, model) = aggregator(search, model, config(2));

        match agg.run("topic").await {
            RunOutcome::Failed { stage, error } => {
                assert_eq!(stage, RunStage::Broaden);
                assert!(matches!(error, DigestError::Search(_)));
            }
            RunOutcome::Completed(_) => panic!("search failure must abort"),
        }
        assert_eq!(model.digest_calls(), 0);
    }

    #[tokio::test]
    async fn digest_failure_reported_at_synthesize() {
        let search = TableSearch::default().answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let mut model = RoutedModel::new(&[]);
        model.fail_digest = true;
        let (agg, _) = aggregator(search, model, config(1));

        match agg.run("topic").await {
            RunOutcome::Failed { stage, error } => {
                assert_eq!(stage, RunStage::Synthesize);
                assert_eq!(error.kind(), crate::error::ErrorKind::Collaborator);
            }
            RunOutcome::Completed(_) => panic!("digest failure must abort"),
        }
    }

    #[tokio::test]
    async fn cancelled_run_fails() {
        let search = TableSearch::default().answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let (agg, _) = aggregator(search, RoutedModel::new(&[]), config(1));
        agg.cancel_token().cancel();

        let err = agg.try_run("topic").await.unwrap_err();
        assert!(matches!(err, DigestError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        struct Stalled;
        impl SearchProvider for Stalled {
            async fn search(&self, _q: &str, _r: usize) -> std::result::Result<Vec<SearchResult>, SearchError> {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            fn name(&self) -> &'static str {
                "stalled"
            }
        }

        let cfg = PipelineConfig {
            call_timeout_seconds: 1,
            ..config(1)
        };
        let (agg, _) = aggregator(Stalled, RoutedModel::new(&[]), cfg);
        let err = agg.try_run("topic").await.unwrap_err();
        assert!(matches!(err, DigestError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn blank_topic_is_config_error() {
        let (agg, _) = aggregator(TableSearch::default(), RoutedModel::new(&[]), config(1));
        let err = agg.try_run(" <> \n ").await.unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
        assert!(agg.search.calls().is_empty());
    }

    #[tokio::test]
    async fn strict_mode_sanitises_expanded_queries() {
        let search = TableSearch::default().answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let model = RoutedModel::new(&[r#"{"queries": ["<b>rust</b>\nasync", "$`"]}"#]);
        let (agg, _) = aggregator(search, model, config(2));

        agg.try_run("topic").await.expect("run completes");
        let queries: Vec<_> = agg.search.calls().into_iter().map(|(q, _)| q).collect();
        assert_eq!(queries, vec!["topic", "brust/b async"]);
    }

    #[tokio::test]
    async fn progress_reports_stages_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let search = TableSearch::default().answer("topic", vec![hit("A", "https://x.test/a", 1)]);
        let (agg, _) = aggregator(search, RoutedModel::new(&[r#"{"queries": []}"#]), config(2));
        let agg = agg.with_progress(Box::new(move |event| {
            if let RunEvent::StageStarted { stage } = event
                && let Ok(mut guard) = sink.lock()
            {
                guard.push(stage);
            }
        }));

        agg.try_run("topic").await.expect("run completes");
        let stages = events.lock().expect("lock").clone();
        assert_eq!(
            stages,
            vec![
                RunStage::Seed,
                RunStage::Expand,
                RunStage::Broaden,
                RunStage::Merge,
                RunStage::Clean,
                RunStage::Enrich,
                RunStage::Rank,
                RunStage::Synthesize
            ]
        );
    }
}
