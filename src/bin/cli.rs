//! CLI binary for webdigest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webdigest::demo::{DemoModel, DemoSearch};
use webdigest::export::{source_line, write_markdown};
use webdigest::pipeline::scoring::rank_scored;
use webdigest::pipeline::{HttpPageFetcher, PageFetcher};
use webdigest::{
    Aggregator, Clock, Credentials, DigestConfig, ModelClient, ModelProvider, RecencyWindow,
    RunEvent, SystemClock, build_model_client,
};
use webdigest_search::{BraveSearch, SearchProvider};

/// WebDigest: iterative web search to a cited one-page Markdown digest.
#[derive(Parser)]
#[command(name = "webdigest", version, about)]
struct Cli {
    /// Topic to research.
    topic: Option<String>,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recency window in days (7, 14, 30, 60 or 90).
    #[arg(long)]
    recency: Option<u32>,

    /// Maximum number of cited sources (5 to 30).
    #[arg(long)]
    max_sources: Option<usize>,

    /// Search rounds (1 to 3).
    #[arg(long)]
    rounds: Option<u8>,

    /// Model provider.
    #[arg(long)]
    provider: Option<ModelProvider>,

    /// Model name for the chosen provider.
    #[arg(long)]
    model: Option<String>,

    /// Disable strict safe-search and result filtering.
    #[arg(long)]
    no_strict: bool,

    /// Run offline with canned search results and model replies.
    #[arg(long)]
    demo: bool,

    /// Directory to write `webdigest_<topic>.md` into.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("webdigest=info,webdigest_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let topic = match (&cli.topic, cli.demo) {
        (Some(topic), _) => topic.clone(),
        (None, true) => "demo".to_owned(),
        (None, false) => anyhow::bail!("please give a topic or pass --demo"),
    };

    if cli.demo {
        println!("WebDigest v{} - Demo Mode", env!("CARGO_PKG_VERSION"));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let search = DemoSearch::with_clock(Arc::clone(&clock));
        return run(search, Arc::new(DemoModel), None, clock, &config, &topic, &cli).await;
    }

    println!("WebDigest v{}", env!("CARGO_PKG_VERSION"));
    let credentials = Credentials::from_env();
    let search_config = config.effective_search();
    let search = BraveSearch::new(search_config.clone(), credentials.search_key()?)
        .context("failed to initialise search provider")?;
    let model = build_model_client(&config.model, credentials.model_key(config.model.provider)?)
        .context("failed to initialise model provider")?;
    let fetcher: Arc<dyn PageFetcher> = Arc::new(
        HttpPageFetcher::new(&search_config, config.pipeline.page_text_chars)
            .context("failed to initialise page fetcher")?,
    );

    run(search, model, Some(fetcher), Arc::new(SystemClock), &config, &topic, &cli).await
}

/// Load the config file (explicit path, else the default location if present)
/// and apply command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<DigestConfig> {
    let mut config = match &cli.config {
        Some(path) => DigestConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let path = DigestConfig::default_config_path();
            if path.exists() {
                DigestConfig::from_file(&path)?
            } else {
                DigestConfig::default()
            }
        }
    };

    if let Some(days) = cli.recency {
        config.pipeline.recency_days = RecencyWindow::try_from(days).map_err(anyhow::Error::msg)?;
    }
    if let Some(n) = cli.max_sources {
        config.pipeline.max_sources = n;
    }
    if let Some(n) = cli.rounds {
        config.pipeline.rounds = n;
    }
    if let Some(provider) = cli.provider {
        config.model.provider = provider;
        if cli.model.is_none() {
            config.model.model = None;
        }
    }
    if let Some(model) = &cli.model {
        config.model.model = Some(model.clone());
    }
    if cli.no_strict {
        config.pipeline.strict = false;
    }

    config.validate()?;
    Ok(config)
}

async fn run<S: SearchProvider>(
    search: S,
    model: Arc<dyn ModelClient>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    clock: Arc<dyn Clock>,
    config: &DigestConfig,
    topic: &str,
    cli: &Cli,
) -> anyhow::Result<()> {
    let mut aggregator = Aggregator::new(search, model, config.pipeline.clone())
        .with_clock(Arc::clone(&clock))
        .with_progress(Box::new(print_progress));
    if let Some(fetcher) = fetcher {
        aggregator = aggregator.with_fetcher(fetcher);
    }

    let cancel = aggregator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, cancelling run...");
            cancel.cancel();
        }
    });

    let report = aggregator.try_run(topic).await?;

    println!("\n{}\n", report.digest.trim_end());
    println!("Cited sources:");
    for scored in rank_scored(&report.sources, clock.now()) {
        println!("  {:.2}  {}", scored.score, source_line(scored.item));
    }

    if let Some(dir) = &cli.out {
        let path = write_markdown(dir, &report)?;
        println!("\nSaved {}", path.display());
    }
    Ok(())
}

fn print_progress(event: RunEvent) {
    match event {
        RunEvent::RoundCompleted { round, results } => {
            println!("Round {round} fetched {results} results");
        }
        RunEvent::QueriesExpanded { queries } if !queries.is_empty() => {
            println!("Follow-up queries: {}", queries.join("; "));
        }
        RunEvent::Cleaned {
            unique, recent, kept, ..
        } => {
            println!("{unique} unique, {recent} recent, keeping {kept}");
        }
        RunEvent::SourceSummarized { done, total } => {
            println!("Summarised {done}/{total}");
        }
        _ => {}
    }
}
