//! Keyword-to-date correlation.
//!
//! For every ranked keyword record, the correlator computes the span
//! (first/last published date) and volume (document count) of the articles
//! that mention it. Two match policies are unified behind one code path:
//!
//! - [`MatchPolicy::WholeWord`]: the keyword, regex-escaped and anchored to
//!   word boundaries, against the lowercased article text. Used together with
//!   topic filtering.
//! - [`MatchPolicy::Stem`]: stem-equality against the article's stemmed token
//!   stream, tolerating inflection. Historically run without a topic filter.
//!
//! Guarantees: an empty keyword matches nothing (an unguarded empty pattern
//! would match everything); regex metacharacters in keywords are matched
//! literally; articles with missing or unparseable dates are excluded from
//! the min/max but still count toward `doc_count`; one output row per input
//! record — duplicates are never merged and no topic or keyword is ever
//! fabricated.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use crate::models::{Article, KeywordDates, KeywordRecord};
use crate::tagger::{keyword_stem, stem_tokens};

/// How a keyword is matched against an article's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Whole-word regex match on the lowercased text.
    WholeWord,
    /// Stem-equality match on the stemmed token stream.
    Stem,
}

struct Prepared {
    topic: Option<i32>,
    date: Option<NaiveDate>,
    text: String,
    stems: HashSet<String>,
}

/// Correlate every keyword record with the articles that mention it.
///
/// With `filter_by_topic` set, only articles assigned to the record's topic
/// are candidates; otherwise the whole collection is searched.
#[instrument(level = "info", skip_all, fields(records = records.len(), articles = articles.len(), ?policy, filter_by_topic))]
pub fn correlate(
    records: &[KeywordRecord],
    articles: &[Article],
    policy: MatchPolicy,
    filter_by_topic: bool,
) -> Vec<KeywordDates> {
    let prepared: Vec<Prepared> = articles
        .iter()
        .map(|a| {
            let text = a.search_text();
            let stems = match policy {
                MatchPolicy::Stem => stem_tokens(&text).into_iter().collect(),
                MatchPolicy::WholeWord => HashSet::new(),
            };
            Prepared {
                topic: a.topic,
                date: a.parsed_date(),
                text,
                stems,
            }
        })
        .collect();

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let keyword = record.keyword.trim().to_lowercase();
        if keyword.is_empty() {
            warn!(topic = record.topic, rank = record.rank, "Empty keyword matches nothing");
            out.push(empty_row(record));
            continue;
        }

        let in_topic =
            |p: &Prepared| !filter_by_topic || p.topic == Some(record.topic);

        let matched: Vec<&Prepared> = match policy {
            MatchPolicy::WholeWord => {
                let pattern = format!(r"\b{}\b", regex::escape(&keyword));
                let re = match Regex::new(&pattern) {
                    Ok(re) => re,
                    Err(e) => {
                        warn!(%keyword, error = %e, "Unusable keyword pattern");
                        out.push(empty_row(record));
                        continue;
                    }
                };
                prepared
                    .iter()
                    .filter(|p| in_topic(p) && re.is_match(&p.text))
                    .collect()
            }
            MatchPolicy::Stem => {
                let stem = keyword_stem(&keyword);
                prepared
                    .iter()
                    .filter(|p| in_topic(p) && p.stems.contains(&stem))
                    .collect()
            }
        };

        if matched.is_empty() {
            out.push(empty_row(record));
            continue;
        }

        let dates: Vec<NaiveDate> = matched.iter().filter_map(|p| p.date).collect();
        out.push(KeywordDates {
            topic: record.topic,
            rank: record.rank,
            keyword: record.keyword.clone(),
            weight: record.weight,
            first_date: dates.iter().min().copied(),
            last_date: dates.iter().max().copied(),
            doc_count: matched.len(),
        });
    }

    info!(
        rows = out.len(),
        matched = out.iter().filter(|r| r.doc_count > 0).count(),
        "Correlation complete"
    );
    out
}

fn empty_row(record: &KeywordRecord) -> KeywordDates {
    KeywordDates {
        topic: record.topic,
        rank: record.rank,
        keyword: record.keyword.clone(),
        weight: record.weight,
        first_date: None,
        last_date: None,
        doc_count: 0,
    }
}
