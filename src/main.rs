//! # riskbeat
//!
//! A risk-signal mining pipeline for blog and news articles. It discovers
//! article URLs from a site's sitemap, extracts content, flags risk keywords,
//! summarizes each post through an LLM, assigns latent topics via an external
//! topic-modeling service, and correlates per-topic keywords with the time
//! span and volume of the articles that mention them.
//!
//! ## Usage
//!
//! ```sh
//! riskbeat ingest --site https://www.example.com
//! riskbeat topics --endpoint http://localhost:8200/fit
//! riskbeat correlate
//! riskbeat run --site https://www.example.com --endpoint http://localhost:8200/fit
//! ```
//!
//! ## Architecture
//!
//! The application follows a staged pipeline, each stage writing a CSV
//! artifact the next stage reads:
//! 1. **Ingest**: sitemap discovery → extraction → keyword flags + summaries
//! 2. **Topics**: topic-model fit → per-article topics, overview, ranked keywords
//! 3. **Correlate**: keyword records joined with matching article dates
//!
//! Per-document failures are logged and skipped; a stage that produces no
//! rows reports it and ends the run without writing an artifact.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod correlate;
mod discovery;
mod extract;
mod ingest;
mod models;
mod outputs;
mod tagger;
mod topics;
mod utils;

use api::Summarizer;
use cli::{Cli, Command, CorrelateArgs, DiscoveryArgs, IngestArgs, RunArgs, TopicsArgs};
use discovery::DiscoveryConfig;
use extract::HttpExtractor;
use models::Article;
use outputs::tables;
use tagger::Vocabulary;
use topics::{HttpTopicModel, ModelTopicsAsync, TopicFit};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("riskbeat starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Ingest(args) => run_ingest(args).await?,
        Command::Topics(args) => run_topics(args).await?,
        Command::Correlate(args) => run_correlate(args).await?,
        Command::Run(args) => run_full(args).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Resolve discovery settings, falling back to the default path hints and
/// exclusion patterns when none were given.
fn discovery_config(args: &DiscoveryArgs) -> DiscoveryConfig {
    let mut cfg = DiscoveryConfig {
        max_urls: args.max_urls,
        ..DiscoveryConfig::default()
    };
    if !args.path_hints.is_empty() {
        cfg.path_hints = args.path_hints.clone();
    }
    if !args.excludes.is_empty() {
        cfg.exclude_patterns = args.excludes.clone();
    }
    cfg
}

fn load_vocabulary(path: Option<&PathBuf>) -> Result<Vocabulary, Box<dyn Error>> {
    match path {
        Some(p) => Vocabulary::from_yaml_file(p),
        None => Ok(Vocabulary::default()),
    }
}

/// Check an output location up front, before the pipeline spends network calls.
async fn check_output_dir(dir: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let dir = if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    };
    if let Err(e) = ensure_writable_dir(&dir.to_string_lossy()).await {
        error!(
            path = %dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    Ok(())
}

/// ---- Stage 1: discover, extract, flag, summarize ----
async fn run_ingest(args: IngestArgs) -> Result<(), Box<dyn Error>> {
    let out_parent = args.out.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    check_output_dir(&out_parent).await?;

    let vocab = load_vocabulary(args.keywords.as_ref())?;
    let cfg = discovery_config(&args.discovery);

    let urls = discovery::discover(&args.site, &cfg).await?;
    if urls.is_empty() {
        warn!(site = %args.site, "No candidate URLs found; ending run without output");
        return Ok(());
    }

    let extractor = HttpExtractor::new()?;
    let summarizer = Summarizer::from_config(args.summary.to_config())?;

    let articles = ingest::enrich_articles(&urls, &extractor, &summarizer, &vocab).await;
    if articles.is_empty() {
        warn!("Nothing extracted; ending run without output");
        return Ok(());
    }

    tables::write_articles(&articles, &args.out).await?;
    info!(count = articles.len(), path = %args.out.display(), "Article table complete");
    Ok(())
}

/// ---- Stage 2: topic-model fit and derived tables ----
async fn run_topics(args: TopicsArgs) -> Result<(), Box<dyn Error>> {
    check_output_dir(&args.out_dir).await?;

    let mut articles = tables::read_articles(&args.articles).await?;
    if articles.is_empty() {
        warn!(path = %args.articles.display(), "Article table is empty; nothing to model");
        return Ok(());
    }

    let docs: Vec<String> = articles.iter().map(Article::doc_text).collect();
    let model = HttpTopicModel::new(args.endpoint.clone())?;
    let fit = model.fit(&docs).await?;

    write_topic_tables(&mut articles, &fit, &args.out_dir).await?;
    Ok(())
}

/// Attach assignments and write the three topic-stage artifacts in
/// dependency order. Returns the ranked keyword records for downstream use.
async fn write_topic_tables(
    articles: &mut [Article],
    fit: &TopicFit,
    out_dir: &std::path::Path,
) -> Result<Vec<models::KeywordRecord>, Box<dyn Error>> {
    topics::assign_topics(articles, &fit.assignments);
    tables::write_articles_with_topics(articles, &out_dir.join("articles_with_topics.csv"))
        .await?;

    let overview = topics::topic_overview(fit);
    tables::write_topic_overview(&overview, &out_dir.join("topics_overview.csv")).await?;

    let records = topics::keyword_table(fit);
    tables::write_keywords(&records, &out_dir.join("keywords_weights.csv")).await?;

    info!(
        topics = overview.len(),
        keywords = records.len(),
        "Topic tables complete"
    );
    Ok(records)
}

/// ---- Stage 3: keyword-to-date correlation ----
async fn run_correlate(args: CorrelateArgs) -> Result<(), Box<dyn Error>> {
    let out_parent = args.out.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    check_output_dir(&out_parent).await?;

    let records = tables::read_keywords(&args.keywords).await?;
    if records.is_empty() {
        warn!(path = %args.keywords.display(), "Keyword table is empty; nothing to correlate");
        return Ok(());
    }
    let articles = tables::read_articles(&args.articles).await?;

    let rows = correlate::correlate(&records, &articles, args.policy.into(), !args.all_topics);
    tables::write_keyword_dates(&rows, &args.out).await?;
    info!(rows = rows.len(), path = %args.out.display(), "Keyword date table complete");
    Ok(())
}

/// ---- Full pipeline: ingest → topics → correlate ----
async fn run_full(args: RunArgs) -> Result<(), Box<dyn Error>> {
    check_output_dir(&args.out_dir).await?;

    let vocab = load_vocabulary(args.keywords.as_ref())?;
    let cfg = discovery_config(&args.discovery);

    let urls = discovery::discover(&args.site, &cfg).await?;
    if urls.is_empty() {
        warn!(site = %args.site, "No candidate URLs found; ending run without output");
        return Ok(());
    }

    let extractor = HttpExtractor::new()?;
    let summarizer = Summarizer::from_config(args.summary.to_config())?;
    let mut articles = ingest::enrich_articles(&urls, &extractor, &summarizer, &vocab).await;
    if articles.is_empty() {
        warn!("Nothing extracted; ending run without output");
        return Ok(());
    }
    tables::write_articles(&articles, &args.out_dir.join("articles.csv")).await?;

    let docs: Vec<String> = articles.iter().map(Article::doc_text).collect();
    let model = HttpTopicModel::new(args.endpoint.clone())?;
    let fit = model.fit(&docs).await?;
    let records = write_topic_tables(&mut articles, &fit, &args.out_dir).await?;

    if records.is_empty() {
        warn!("No keywords extracted; skipping correlation");
        return Ok(());
    }
    let rows = correlate::correlate(&records, &articles, args.policy.into(), !args.all_topics);
    tables::write_keyword_dates(&rows, &args.out_dir.join("keywords_with_dates.csv")).await?;
    info!(rows = rows.len(), "Pipeline complete");
    Ok(())
}
