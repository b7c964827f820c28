//! Article content extraction.
//!
//! [`ExtractAsync`] is the narrow seam between the pipeline and the page
//! fetcher, so the ingestion loop can be driven by deterministic fakes in
//! tests. The production implementation, [`HttpExtractor`], fetches the page
//! and pulls title, published date, and body text out of the usual metadata
//! locations:
//!
//! - title: `og:title` meta, then `<title>`, then the first `<h1>`
//! - date: `article:published_time` meta, then a `date` meta, then the first
//!   `<time datetime>` attribute
//! - body: paragraph text under `<article>`, then `<main>`, then any `<p>`
//!
//! A missing date is valid; a page yielding neither title nor body is
//! reported as `None` and skipped by the caller.

use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

/// Structured content extracted from one article page.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub title: String,
    /// Raw published-date string; empty when the page carries none.
    pub date: String,
    pub text: String,
}

/// Async content extraction from a URL.
///
/// `Ok(None)` means the page had no usable content; errors mean the fetch
/// itself failed. The ingestion loop treats both the same way: log and skip.
pub trait ExtractAsync {
    async fn extract(&self, url: &str) -> Result<Option<Extracted>, Box<dyn Error>>;
}

/// Production extractor backed by a timeout-bearing HTTP client.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl ExtractAsync for HttpExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<Option<Extracted>, Box<dyn Error>> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = body.len(), "Fetched article page");
        Ok(parse_page(&body))
    }
}

/// Pull title/date/body out of an HTML document.
///
/// Returns `None` when neither a title nor any body text could be found.
pub fn parse_page(html: &str) -> Option<Extracted> {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| first_text(&document, "title"))
        .or_else(|| first_text(&document, "h1"))
        .unwrap_or_default();

    let date = meta_content(&document, r#"meta[property="article:published_time"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="date"]"#))
        .or_else(|| time_datetime(&document))
        .unwrap_or_default();

    let text = paragraph_text(&document);

    if title.is_empty() && text.is_empty() {
        return None;
    }
    Some(Extracted { title, date, text })
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    document
        .select(&sel)
        .find_map(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    document
        .select(&sel)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|s| !s.is_empty())
}

fn time_datetime(document: &Html) -> Option<String> {
    let sel = Selector::parse("time[datetime]").unwrap();
    document
        .select(&sel)
        .find_map(|e| e.value().attr("datetime"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn paragraph_text(document: &Html) -> String {
    for selector in ["article p", "main p", "p"] {
        let sel = Selector::parse(selector).unwrap();
        let paragraphs: Vec<String> = document
            .select(&sel)
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("\n");
        }
    }
    String::new()
}
