//! Output generation for the pipeline's tabular artifacts.
//!
//! Every persisted artifact is a CSV table, produced in dependency order:
//!
//! ```text
//! articles.csv                  # ingest
//! articles_with_topics.csv      # topics (adds the topic column)
//! topics_overview.csv           # topics
//! keywords_weights.csv          # topics
//! keywords_with_dates.csv       # correlate (adds first/last date + count)
//! ```
//!
//! Writers assemble the full table in memory and write atomically
//! (temp file + rename), so a failing run can never corrupt or truncate a
//! previously written artifact.

pub mod tables;
