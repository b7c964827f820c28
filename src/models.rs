//! Data models for enriched articles and derived keyword tables.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Article`]: An enriched article row (extraction + flags + summary)
//! - [`KeywordRecord`]: One ranked (keyword, weight) pair attributed to a topic
//! - [`KeywordDates`]: A keyword record joined with its temporal statistics
//! - [`TopicSummary`]: One row of the topic overview table
//!
//! Articles are created once by the ingestion stage and are immutable except
//! for the `topic` field, which the topic-modeling stage fills in later.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::parse_published_date;

/// The reserved topic id for outlier/unclustered documents.
///
/// Documents assigned this id participate in the topic overview but are
/// excluded from keyword extraction and correlation output.
pub const OUTLIER_TOPIC: i32 = -1;

/// An enriched article produced by the ingestion stage.
///
/// Identity is the `url`; discovery deduplicates before ingestion so URLs are
/// unique within a run. `published` is carried as the raw metadata string —
/// possibly empty — and parsed lazily, because a missing or malformed date is
/// valid article data, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// The article headline.
    #[serde(default)]
    pub title: String,
    /// The canonical URL the article was extracted from.
    pub url: String,
    /// The raw published-date string from page metadata; empty when unknown.
    #[serde(default)]
    pub published: String,
    /// The extracted body text.
    #[serde(default)]
    pub full_text: String,
    /// The LLM-generated synopsis; empty when summarization failed or is disabled.
    #[serde(default)]
    pub summary: String,
    /// Sorted, deduplicated, comma-joined vocabulary terms found in the body.
    #[serde(default)]
    pub red_flag_words: String,
    /// Number of terms in `red_flag_words`; zero iff the string is empty.
    #[serde(default)]
    pub red_flag_count: usize,
    /// Topic id assigned by the topic-modeling stage; `None` before assignment.
    #[serde(default)]
    pub topic: Option<i32>,
}

impl Article {
    /// Lowercased title + body, the text searched by the correlator.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.full_text).to_lowercase()
    }

    /// Title + body joined into the single document fed to the topic modeler.
    pub fn doc_text(&self) -> String {
        format!("{}. {}", self.title, self.full_text)
    }

    /// The published date, if the raw string parses under any known format.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_published_date(&self.published)
    }
}

/// One ranked (keyword, weight) pair attributed to a topic.
///
/// `rank` is 1-based and positional within the topic's ranked list, preserving
/// the topic model's native order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecord {
    /// The topic this keyword belongs to (never [`OUTLIER_TOPIC`]).
    pub topic: i32,
    /// 1-based position within the topic's keyword list.
    pub rank: usize,
    /// The keyword text.
    pub keyword: String,
    /// The topic model's weight for this keyword.
    pub weight: f64,
}

/// A keyword record joined with the span and volume of matching articles.
///
/// One of these exists per [`KeywordRecord`] — duplicate keyword texts within
/// a topic each keep their own row. `doc_count` counts every matched article,
/// including ones whose dates were missing and therefore excluded from the
/// `first_date`/`last_date` computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordDates {
    pub topic: i32,
    pub rank: usize,
    pub keyword: String,
    pub weight: f64,
    /// Earliest parseable date among matched articles; `None` when no match
    /// had a usable date.
    pub first_date: Option<NaiveDate>,
    /// Latest parseable date among matched articles.
    pub last_date: Option<NaiveDate>,
    /// Number of matched articles, dated or not.
    pub doc_count: usize,
}

/// One row of the topic overview table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    /// The topic id; the outlier topic appears here (but nowhere downstream).
    pub topic: i32,
    /// Number of articles assigned to this topic.
    pub count: usize,
    /// Display name in `{id}_{top_words}` form, e.g. `0_phishing_scam_fraud`.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, text: &str, published: &str) -> Article {
        Article {
            title: title.to_string(),
            url: "https://example.com/post".to_string(),
            published: published.to_string(),
            full_text: text.to_string(),
            summary: String::new(),
            red_flag_words: String::new(),
            red_flag_count: 0,
            topic: None,
        }
    }

    #[test]
    fn test_search_text_is_lowercased_title_plus_body() {
        let a = article("Phishing Surge", "Attackers Ramp Up.", "");
        assert_eq!(a.search_text(), "phishing surge attackers ramp up.");
    }

    #[test]
    fn test_doc_text_joins_with_period() {
        let a = article("Title", "Body text", "");
        assert_eq!(a.doc_text(), "Title. Body text");
    }

    #[test]
    fn test_parsed_date_plain_iso() {
        let a = article("t", "b", "2023-06-15");
        assert_eq!(a.parsed_date(), NaiveDate::from_ymd_opt(2023, 6, 15));
    }

    #[test]
    fn test_parsed_date_missing_is_none() {
        let a = article("t", "b", "");
        assert_eq!(a.parsed_date(), None);
    }

    #[test]
    fn test_article_roundtrips_through_serde() {
        let a = article("Title", "Body", "2024-01-02");
        let json = serde_json::to_string(&a).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Title");
        assert_eq!(back.published, "2024-01-02");
        assert_eq!(back.topic, None);
    }

    #[test]
    fn test_keyword_dates_defaults_to_empty_span() {
        let kd = KeywordDates {
            topic: 0,
            rank: 1,
            keyword: "fraud".to_string(),
            weight: 0.5,
            first_date: None,
            last_date: None,
            doc_count: 0,
        };
        assert!(kd.first_date.is_none());
        assert!(kd.last_date.is_none());
        assert_eq!(kd.doc_count, 0);
    }
}
