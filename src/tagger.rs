//! Feature tagging: red-flag keyword matching and word stemming.
//!
//! Two deliberately different matching policies live here:
//!
//! - **Substring flagging** ([`Vocabulary::find_red_flags`]) is the
//!   user-facing red-flag indicator. It matches vocabulary terms anywhere in
//!   the body, including inside longer words — "fraud" flags an article that
//!   only says "fraudster". Recall over precision.
//! - **Stem matching** ([`keyword_stem`] / [`stem_tokens`]) backs the
//!   keyword-to-date correlator. A keyword matches only when its stem appears
//!   as a whole token in the stemmed body, so "frauds" matches "fraud" but
//!   "fraudster" does not. Precision over recall.
//!
//! Both are externally observable outputs and must not be merged.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tracing::info;

/// Default risk-term vocabulary used when no vocabulary file is supplied.
const RISK_KEYWORDS: &[&str] = &[
    "fraud",
    "scam",
    "phishing",
    "identity theft",
    "money laundering",
    "fake website",
    "credit card",
    "chargeback",
    "payment fraud",
    "cyber attack",
    "ransomware",
    "social engineering",
    "account takeover",
    "malware",
    "spoofing",
    "breach",
    "investment fraud",
];

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// The fixed set of risk terms matched against article bodies.
///
/// Terms are held lowercased; matching is case-insensitive substring search.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(RISK_KEYWORDS.iter().map(|s| s.to_string()))
    }
}

impl Vocabulary {
    /// Build a vocabulary from arbitrary terms, lowercasing and dropping blanks.
    pub fn new(terms: impl IntoIterator<Item = String>) -> Self {
        let terms = terms
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Load a vocabulary from a YAML file containing a list of terms.
    pub fn from_yaml_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum VocabFile {
            Bare(Vec<String>),
            Keyed { terms: Vec<String> },
        }

        let raw = std::fs::read_to_string(path)?;
        let parsed: VocabFile = serde_yaml::from_str(&raw)?;
        let terms = match parsed {
            VocabFile::Bare(terms) | VocabFile::Keyed { terms } => terms,
        };
        let vocab = Self::new(terms);
        info!(path = %path.display(), terms = vocab.len(), "Loaded keyword vocabulary");
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Return the vocabulary terms found in `text`, as a sorted, deduplicated,
    /// comma-joined string.
    ///
    /// Matching is case-insensitive substring search — not word-boundary
    /// restricted, so "fraud" matches "frauds" and "fraudster" alike. An empty
    /// body yields an empty string.
    pub fn find_red_flags(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let t = text.to_lowercase();
        let mut found: Vec<&str> = self
            .terms
            .iter()
            .filter(|term| t.contains(term.as_str()))
            .map(|term| term.as_str())
            .collect();
        found.sort_unstable();
        found.dedup();
        found.join(", ")
    }
}

/// Count the terms in a comma-joined flag string.
///
/// The empty string is zero terms — splitting it would yield one empty token,
/// which must not count as a match.
pub fn flag_count(flags: &str) -> usize {
    if flags.is_empty() {
        0
    } else {
        flags.split(',').count()
    }
}

/// Stem a keyword for token-level matching.
///
/// The whole lowercased keyword is stemmed as a single token. Multi-word
/// keywords therefore produce a stem no tokenized document contains, and
/// never match under the stem policy; the word-boundary policy handles them.
pub fn keyword_stem(keyword: &str) -> String {
    STEMMER.stem(&keyword.trim().to_lowercase()).into_owned()
}

/// Tokenize text on word boundaries and stem every token.
pub fn stem_tokens(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| STEMMER.stem(m.as_str()).into_owned())
        .collect()
}
