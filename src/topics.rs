//! Topic-model collaborator seam and the tables derived from its output.
//!
//! Topic modeling itself (embedding + clustering + per-topic keyword ranking)
//! is an external collaborator reached over HTTP. This module owns the seam
//! ([`ModelTopicsAsync`]) and everything derived from a fit: attaching topic
//! ids to articles, the topic overview table, and the ranked keyword table.
//!
//! Topic `-1` is the collaborator's outlier bucket. It shows up in the
//! overview (it is a real document count) but never in the keyword table, and
//! therefore never in correlation output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{Article, KeywordRecord, OUTLIER_TOPIC, TopicSummary};

/// Number of top keywords woven into a topic's display name.
const NAME_WORDS: usize = 3;

/// The result of one topic-model fit over a document collection.
#[derive(Debug, Clone)]
pub struct TopicFit {
    /// One topic id per input document, in input order.
    pub assignments: Vec<i32>,
    /// Ranked (keyword, weight) list per topic, in the model's native order.
    pub keywords: BTreeMap<i32, Vec<(String, f64)>>,
}

/// Async topic-model fitting over a document collection.
pub trait ModelTopicsAsync {
    async fn fit(&self, docs: &[String]) -> Result<TopicFit, Box<dyn Error>>;
}

#[derive(Serialize)]
struct FitRequest<'a> {
    documents: &'a [String],
}

#[derive(Deserialize)]
struct FitResponse {
    topics: Vec<i32>,
    #[serde(default)]
    keywords: BTreeMap<String, Vec<(String, f64)>>,
}

/// Topic-model collaborator reached over HTTP.
///
/// Posts the document collection as JSON and expects per-document topic ids
/// plus per-topic ranked keyword lists back.
#[derive(Debug, Clone)]
pub struct HttpTopicModel {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTopicModel {
    pub fn new(endpoint: String) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { endpoint, client })
    }
}

impl ModelTopicsAsync for HttpTopicModel {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, docs = docs.len()))]
    async fn fit(&self, docs: &[String]) -> Result<TopicFit, Box<dyn Error>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&FitRequest { documents: docs })
            .send()
            .await?
            .error_for_status()?;
        let raw: FitResponse = resp.json().await?;
        let fit = parse_fit(raw, docs.len())?;
        info!(
            topics = fit.keywords.len(),
            assignments = fit.assignments.len(),
            "Topic model fit completed"
        );
        Ok(fit)
    }
}

/// Validate and convert a wire response into a [`TopicFit`].
fn parse_fit(raw: FitResponse, doc_count: usize) -> Result<TopicFit, Box<dyn Error>> {
    if raw.topics.len() != doc_count {
        return Err(format!(
            "topic model returned {} assignments for {} documents",
            raw.topics.len(),
            doc_count
        )
        .into());
    }
    let mut keywords = BTreeMap::new();
    for (topic, words) in raw.keywords {
        let topic: i32 = topic
            .parse()
            .map_err(|_| format!("non-integer topic id in keyword map: {topic:?}"))?;
        keywords.insert(topic, words);
    }
    Ok(TopicFit {
        assignments: raw.topics,
        keywords,
    })
}

/// Attach topic assignments to articles, in order.
///
/// Lengths must already match; [`ModelTopicsAsync::fit`] guarantees it for
/// fits produced by this module.
pub fn assign_topics(articles: &mut [Article], assignments: &[i32]) {
    for (article, &topic) in articles.iter_mut().zip(assignments) {
        article.topic = Some(topic);
    }
}

/// Build the topic overview table: document count and display name per topic.
///
/// Every topic that appears in the assignments or the keyword map gets a row,
/// the outlier topic included.
pub fn topic_overview(fit: &TopicFit) -> Vec<TopicSummary> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for &topic in &fit.assignments {
        *counts.entry(topic).or_default() += 1;
    }
    for &topic in fit.keywords.keys() {
        counts.entry(topic).or_default();
    }

    counts
        .into_iter()
        .map(|(topic, count)| TopicSummary {
            topic,
            count,
            name: topic_name(topic, fit.keywords.get(&topic)),
        })
        .collect()
}

fn topic_name(topic: i32, words: Option<&Vec<(String, f64)>>) -> String {
    let top: Vec<&str> = words
        .map(|w| w.iter().take(NAME_WORDS).map(|(kw, _)| kw.as_str()).collect())
        .unwrap_or_default();
    if top.is_empty() {
        let label = if topic == OUTLIER_TOPIC { "outliers" } else { "unlabeled" };
        format!("{topic}_{label}")
    } else {
        format!("{topic}_{}", top.join("_"))
    }
}

/// Build the ranked keyword table from a fit.
///
/// Ranks are 1-based positions in the model's native order; the outlier topic
/// is excluded, always.
pub fn keyword_table(fit: &TopicFit) -> Vec<KeywordRecord> {
    let mut records = Vec::new();
    for (&topic, words) in &fit.keywords {
        if topic == OUTLIER_TOPIC {
            continue;
        }
        for (i, (keyword, weight)) in words.iter().enumerate() {
            records.push(KeywordRecord {
                topic,
                rank: i + 1,
                keyword: keyword.clone(),
                weight: *weight,
            });
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fit() -> TopicFit {
        let mut keywords = BTreeMap::new();
        keywords.insert(
            0,
            vec![
                ("phishing".to_string(), 0.9),
                ("email".to_string(), 0.7),
                ("credential".to_string(), 0.5),
                ("lure".to_string(), 0.2),
            ],
        );
        keywords.insert(1, vec![("chargeback".to_string(), 0.8)]);
        keywords.insert(OUTLIER_TOPIC, vec![("misc".to_string(), 0.1)]);
        TopicFit {
            assignments: vec![0, 0, 1, OUTLIER_TOPIC],
            keywords,
        }
    }

    #[test]
    fn test_keyword_table_excludes_outlier_topic() {
        let records = keyword_table(&sample_fit());
        assert!(records.iter().all(|r| r.topic != OUTLIER_TOPIC));
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_keyword_table_ranks_are_one_based_native_order() {
        let records = keyword_table(&sample_fit());
        let topic0: Vec<_> = records.iter().filter(|r| r.topic == 0).collect();
        assert_eq!(topic0[0].rank, 1);
        assert_eq!(topic0[0].keyword, "phishing");
        assert_eq!(topic0[3].rank, 4);
        assert_eq!(topic0[3].keyword, "lure");
    }

    #[test]
    fn test_topic_overview_counts_and_names() {
        let overview = topic_overview(&sample_fit());
        let by_id: BTreeMap<i32, &TopicSummary> =
            overview.iter().map(|t| (t.topic, t)).collect();
        assert_eq!(by_id[&0].count, 2);
        assert_eq!(by_id[&0].name, "0_phishing_email_credential");
        assert_eq!(by_id[&1].count, 1);
        assert_eq!(by_id[&1].name, "1_chargeback");
        assert_eq!(by_id[&OUTLIER_TOPIC].count, 1);
    }

    #[test]
    fn test_topic_overview_includes_outliers() {
        let overview = topic_overview(&sample_fit());
        assert!(overview.iter().any(|t| t.topic == OUTLIER_TOPIC));
    }

    #[test]
    fn test_topic_name_fallbacks() {
        assert_eq!(topic_name(OUTLIER_TOPIC, None), "-1_outliers");
        assert_eq!(topic_name(7, None), "7_unlabeled");
    }

    #[test]
    fn test_assign_topics_in_order() {
        let mut articles: Vec<Article> = (0..3)
            .map(|i| Article {
                title: format!("t{i}"),
                url: format!("https://example.com/{i}"),
                published: String::new(),
                full_text: String::new(),
                summary: String::new(),
                red_flag_words: String::new(),
                red_flag_count: 0,
                topic: None,
            })
            .collect();
        assign_topics(&mut articles, &[2, OUTLIER_TOPIC, 0]);
        assert_eq!(articles[0].topic, Some(2));
        assert_eq!(articles[1].topic, Some(OUTLIER_TOPIC));
        assert_eq!(articles[2].topic, Some(0));
    }

    #[test]
    fn test_parse_fit_validates_lengths() {
        let raw: FitResponse = serde_json::from_str(
            r#"{"topics": [0, 1], "keywords": {"0": [["phishing", 0.9]]}}"#,
        )
        .unwrap();
        assert!(parse_fit(raw, 3).is_err());
    }

    #[test]
    fn test_parse_fit_wire_format() {
        let raw: FitResponse = serde_json::from_str(
            r#"{"topics": [0, -1], "keywords": {"0": [["phishing", 0.9], ["scam", 0.4]], "-1": []}}"#,
        )
        .unwrap();
        let fit = parse_fit(raw, 2).unwrap();
        assert_eq!(fit.assignments, vec![0, -1]);
        assert_eq!(fit.keywords[&0][1].0, "scam");
        assert!(fit.keywords.contains_key(&OUTLIER_TOPIC));
    }

    #[test]
    fn test_parse_fit_rejects_bad_topic_key() {
        let raw: FitResponse =
            serde_json::from_str(r#"{"topics": [0], "keywords": {"abc": []}}"#).unwrap();
        assert!(parse_fit(raw, 1).is_err());
    }
}
