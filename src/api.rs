//! Summarization API interaction with exponential backoff retry logic.
//!
//! This module talks to an OpenAI-compatible chat-completions endpoint to
//! produce a short synopsis per article. It uses a trait-based design:
//!
//! - [`SummarizeAsync`]: core trait defining async summarization
//! - [`ChatClient`]: reqwest-backed chat-completions implementation
//! - [`RetrySummarize`]: decorator that adds retry logic to any implementation
//! - [`Summarizer`]: the resolved runtime summarizer, including the explicit
//!   disabled state used when no API key is configured
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! A summarization failure is never fatal to the pipeline: the ingestion loop
//! stores an empty summary for that one document and continues.

use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Body text beyond this many characters is not sent to the model.
const PROMPT_TEXT_CAP: usize = 8000;

/// Trait for async article summarization.
///
/// Implementors take a title and body text and return a short synopsis. The
/// abstraction exists so the ingestion loop can run against deterministic
/// fakes in tests and so decorators (like retry logic) can wrap any backend.
pub trait SummarizeAsync {
    /// Produce a short synopsis of the article.
    async fn summarize(&self, title: &str, text: &str) -> Result<String, Box<dyn Error>>;
}

/// Connection settings for the summarization endpoint, resolved once at
/// startup from CLI flags and environment variables.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API, without the trailing route.
    pub base_url: String,
    pub model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Chat-completions client for an OpenAI-compatible API.
#[derive(Debug)]
pub struct ChatClient {
    config: SummaryConfig,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: SummaryConfig) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(60))
            .build()?;
        Ok(Self { config, client })
    }
}

impl SummarizeAsync for ChatClient {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, title: &str, text: &str) -> Result<String, Box<dyn Error>> {
        let prompt = build_prompt(title, text);
        let body = ChatRequest {
            model: &self.config.model,
            temperature: 0.3,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You summarize blog posts accurately and concisely.",
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let t0 = Instant::now();
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.trim())
            .json(&body)
            .send()
            .await?;
        let dt = t0.elapsed();

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            warn!(elapsed_ms = dt.as_millis() as u128, %status, "Summary API call failed");
            return Err(format!("summary API returned {status}: {detail}").into());
        }

        let parsed: ChatResponse = resp.json().await?;
        let summary = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        Ok(summary)
    }
}

/// Build the summarization prompt, capping body text at [`PROMPT_TEXT_CAP`]
/// characters.
fn build_prompt(title: &str, text: &str) -> String {
    let capped: String = text.chars().take(PROMPT_TEXT_CAP).collect();
    format!(
        "Summarize this blog post in 2-3 short sentences. \
         Focus on the main topic and insights.\nTitle: {title}\nText:\n{capped}"
    )
}

/// Wrapper that adds exponential backoff retry logic to any [`SummarizeAsync`]
/// implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetrySummarize<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetrySummarize<T>
where
    T: SummarizeAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetrySummarize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySummarize")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> SummarizeAsync for RetrySummarize<T>
where
    T: SummarizeAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, title: &str, text: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.summarize(title, text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "summarize() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// The summarizer resolved from configuration at startup.
///
/// Missing credentials degrade to an explicit disabled state — announced once,
/// producing empty summaries for every document — rather than failing on the
/// first API call deep in the ingestion loop.
pub enum Summarizer {
    Chat(RetrySummarize<ChatClient>),
    Disabled,
}

impl Summarizer {
    pub fn from_config(config: Option<SummaryConfig>) -> Result<Self, Box<dyn Error>> {
        match config {
            Some(config) => {
                info!(model = %config.model, base_url = %config.base_url, "Summarizer enabled");
                let client = ChatClient::new(config)?;
                Ok(Self::Chat(RetrySummarize::new(
                    client,
                    5,
                    StdDuration::from_secs(1),
                )))
            }
            None => {
                warn!("No summary API key configured; summaries disabled for this run");
                Ok(Self::Disabled)
            }
        }
    }
}

impl SummarizeAsync for Summarizer {
    async fn summarize(&self, title: &str, text: &str) -> Result<String, Box<dyn Error>> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        match self {
            Self::Chat(client) => client.summarize(title, text).await,
            Self::Disabled => Ok(String::new()),
        }
    }
}
