//! Command-line interface definitions for riskbeat.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Each pipeline stage is a subcommand operating on the previous stage's CSV
//! artifact, with `run` chaining them end to end. Credentials and endpoints
//! can be provided via command-line flags or environment variables and are
//! resolved once at startup.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::SummaryConfig;
use crate::correlate::MatchPolicy;

/// Command-line arguments for the riskbeat pipeline.
///
/// # Examples
///
/// ```sh
/// # Enrich a site's blog into a CSV table
/// riskbeat ingest --site https://www.example.com --out articles.csv
///
/// # Fit topics through the topic-model service
/// riskbeat topics --endpoint http://localhost:8200/fit
///
/// # Correlate keywords with article dates, the historical stem variant
/// riskbeat correlate --policy stem --all-topics
///
/// # Everything at once
/// riskbeat run --site https://www.example.com --endpoint http://localhost:8200/fit
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover, extract, flag, and summarize articles into a CSV table
    Ingest(IngestArgs),
    /// Fit the topic model and derive the topic and keyword tables
    Topics(TopicsArgs),
    /// Join keyword records with the dates and volume of matching articles
    Correlate(CorrelateArgs),
    /// Run ingest, topics, and correlate in sequence
    Run(RunArgs),
}

/// Keyword matching policy for correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Whole-word regex match on the lowercased article text
    Word,
    /// Stem-equality match on the stemmed token stream
    Stem,
}

impl From<Policy> for MatchPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Word => MatchPolicy::WholeWord,
            Policy::Stem => MatchPolicy::Stem,
        }
    }
}

/// Summarization endpoint settings, shared by `ingest` and `run`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// API key for the summarization endpoint; summaries are disabled when unset
    #[arg(long, env = "SUMMARY_API_KEY")]
    pub summary_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible summarization API
    #[arg(
        long,
        env = "SUMMARY_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub summary_base_url: String,

    /// Model requested for summaries
    #[arg(long, env = "SUMMARY_MODEL", default_value = "gpt-4o-mini")]
    pub summary_model: String,
}

impl SummaryArgs {
    /// Resolve to a summarizer config, or `None` when no key is configured.
    pub fn to_config(&self) -> Option<SummaryConfig> {
        self.summary_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|key| SummaryConfig {
                api_key: key.to_string(),
                base_url: self.summary_base_url.clone(),
                model: self.summary_model.clone(),
            })
    }
}

/// Discovery settings, shared by `ingest` and `run`.
#[derive(Args, Debug)]
pub struct DiscoveryArgs {
    /// Maximum number of candidate URLs taken from the sitemap
    #[arg(long, default_value_t = 150)]
    pub max_urls: usize,

    /// URL path fragment a candidate must contain (repeatable; defaults to
    /// the standard blog paths when omitted)
    #[arg(long = "path-hint")]
    pub path_hints: Vec<String>,

    /// URL path fragment that disqualifies a candidate (repeatable; defaults
    /// to tag/category/author/pagination listings when omitted)
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Root URL of the site whose sitemap is searched
    #[arg(short, long)]
    pub site: String,

    /// Output path for the article table
    #[arg(short, long, default_value = "articles.csv")]
    pub out: PathBuf,

    /// YAML file listing the red-flag keyword vocabulary
    #[arg(long)]
    pub keywords: Option<PathBuf>,

    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    #[command(flatten)]
    pub summary: SummaryArgs,
}

#[derive(Args, Debug)]
pub struct TopicsArgs {
    /// Path to the enriched article table
    #[arg(short, long, default_value = "articles.csv")]
    pub articles: PathBuf,

    /// URL of the topic-model fit endpoint
    #[arg(short, long, env = "TOPIC_MODEL_URL")]
    pub endpoint: String,

    /// Directory the derived tables are written into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct CorrelateArgs {
    /// Path to the keyword-weight table
    #[arg(short, long, default_value = "keywords_weights.csv")]
    pub keywords: PathBuf,

    /// Path to the article table (with topics for the topic-filtered mode)
    #[arg(short, long, default_value = "articles_with_topics.csv")]
    pub articles: PathBuf,

    /// Output path for the keyword table with dates
    #[arg(short, long, default_value = "keywords_with_dates.csv")]
    pub out: PathBuf,

    /// Keyword matching policy
    #[arg(long, value_enum, default_value_t = Policy::Word)]
    pub policy: Policy,

    /// Match across all articles instead of restricting to the record's topic
    #[arg(long)]
    pub all_topics: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Root URL of the site whose sitemap is searched
    #[arg(short, long)]
    pub site: String,

    /// Directory all artifacts are written into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// URL of the topic-model fit endpoint
    #[arg(short, long, env = "TOPIC_MODEL_URL")]
    pub endpoint: String,

    /// YAML file listing the red-flag keyword vocabulary
    #[arg(long)]
    pub keywords: Option<PathBuf>,

    /// Keyword matching policy for the correlation stage
    #[arg(long, value_enum, default_value_t = Policy::Word)]
    pub policy: Policy,

    /// Match across all articles instead of restricting to the record's topic
    #[arg(long)]
    pub all_topics: bool,

    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    #[command(flatten)]
    pub summary: SummaryArgs,
}
