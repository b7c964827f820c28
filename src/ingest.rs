//! Per-URL enrichment: extraction, keyword flagging, summarization.
//!
//! The loop is sequential and per-item fault tolerant: every candidate URL is
//! attempted, failures are logged and skipped, and only the surviving
//! documents become [`Article`] rows. A summarization failure downgrades that
//! one document to an empty summary; it never stops the run.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::api::SummarizeAsync;
use crate::extract::ExtractAsync;
use crate::models::Article;
use crate::tagger::{Vocabulary, flag_count};
use crate::utils::truncate_for_log;

/// Enrich every candidate URL into an [`Article`], in order.
///
/// A URL survives when extraction succeeds and yields at least a title or
/// body text. The returned collection may be empty; the caller decides how to
/// report that.
#[instrument(level = "info", skip_all, fields(candidates = urls.len()))]
pub async fn enrich_articles<E, S>(
    urls: &[String],
    extractor: &E,
    summarizer: &S,
    vocab: &Vocabulary,
) -> Vec<Article>
where
    E: ExtractAsync,
    S: SummarizeAsync,
{
    let total = urls.len();
    let results: Vec<Option<Article>> = stream::iter(urls.iter().enumerate())
        .then(|(i, url)| async move {
            enrich_one(i + 1, total, url, extractor, summarizer, vocab).await
        })
        .collect()
        .await;

    let articles: Vec<Article> = results.into_iter().flatten().collect();
    info!(count = articles.len(), total, "Enrichment complete");
    articles
}

/// Enrich a single URL; `None` means it was skipped.
async fn enrich_one<E, S>(
    index: usize,
    total: usize,
    url: &str,
    extractor: &E,
    summarizer: &S,
    vocab: &Vocabulary,
) -> Option<Article>
where
    E: ExtractAsync,
    S: SummarizeAsync,
{
    let extracted = match extractor.extract(url).await {
        Ok(Some(e)) => e,
        Ok(None) => {
            warn!(index, total, %url, "Extraction produced no content; skipping");
            return None;
        }
        Err(e) => {
            warn!(index, total, %url, error = %e, "Extraction failed; skipping");
            return None;
        }
    };

    let title = extracted.title.trim().to_string();
    let text = extracted.text.trim().to_string();
    if title.is_empty() && text.is_empty() {
        debug!(index, total, %url, "Neither title nor body text; skipping");
        return None;
    }

    let red_flag_words = vocab.find_red_flags(&text);
    let red_flag_count = flag_count(&red_flag_words);

    let summary = match summarizer.summarize(&title, &text).await {
        Ok(s) => s,
        Err(e) => {
            warn!(index, total, %url, error = %e, "Summarization failed; storing empty summary");
            String::new()
        }
    };

    info!(
        index,
        total,
        title = %truncate_for_log(&title, 80),
        flags = red_flag_count,
        "Enriched article"
    );
    Some(Article {
        title,
        url: url.to_string(),
        published: extracted.date.trim().to_string(),
        full_text: text,
        summary,
        red_flag_words,
        red_flag_count,
        topic: None,
    })
}
