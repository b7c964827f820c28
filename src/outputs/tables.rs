//! CSV readers and writers for the pipeline artifacts.
//!
//! Write side: each table is fully serialized in memory, written to a `.tmp`
//! sibling, and renamed into place. Read side: rows deserialize leniently —
//! a column missing from an upstream file (an articles table without
//! `published`, or one without `topic`) degrades to blank/absent values
//! instead of failing the run.

use csv::{Reader, Writer};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use crate::models::{Article, KeywordDates, KeywordRecord, TopicSummary};

#[derive(Serialize)]
struct ArticleRow<'a> {
    title: &'a str,
    url: &'a str,
    published: &'a str,
    full_text: &'a str,
    summary: &'a str,
    red_flag_words: &'a str,
    red_flag_count: usize,
}

#[derive(Serialize)]
struct TopicArticleRow<'a> {
    title: &'a str,
    url: &'a str,
    published: &'a str,
    full_text: &'a str,
    summary: &'a str,
    red_flag_words: &'a str,
    red_flag_count: usize,
    topic: Option<i32>,
}

/// Write the enriched article table.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub async fn write_articles(articles: &[Article], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(Vec::new());
    for a in articles {
        wtr.serialize(ArticleRow {
            title: &a.title,
            url: &a.url,
            published: &a.published,
            full_text: &a.full_text,
            summary: &a.summary,
            red_flag_words: &a.red_flag_words,
            red_flag_count: a.red_flag_count,
        })?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, bytes).await
}

/// Write the article table with the topic column appended.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub async fn write_articles_with_topics(
    articles: &[Article],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(Vec::new());
    for a in articles {
        wtr.serialize(TopicArticleRow {
            title: &a.title,
            url: &a.url,
            published: &a.published,
            full_text: &a.full_text,
            summary: &a.summary,
            red_flag_words: &a.red_flag_words,
            red_flag_count: a.red_flag_count,
            topic: a.topic,
        })?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, bytes).await
}

/// Write the topic overview table.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = topics.len()))]
pub async fn write_topic_overview(
    topics: &[TopicSummary],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(Vec::new());
    for t in topics {
        wtr.serialize(t)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, bytes).await
}

/// Write the ranked keyword-weight table.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub async fn write_keywords(
    records: &[KeywordRecord],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(Vec::new());
    for r in records {
        wtr.serialize(r)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, bytes).await
}

/// Write the keyword table joined with first/last dates and document counts.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_keyword_dates(
    rows: &[KeywordDates],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(Vec::new());
    for r in rows {
        wtr.serialize(r)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, bytes).await
}

/// Read an article table, with or without the topic column.
pub async fn read_articles(path: &Path) -> Result<Vec<Article>, Box<dyn Error>> {
    let raw = fs::read(path).await?;
    let mut rdr = Reader::from_reader(raw.as_slice());
    let mut articles = Vec::new();
    for row in rdr.deserialize::<Article>() {
        articles.push(row?);
    }
    info!(path = %path.display(), rows = articles.len(), "Read article table");
    Ok(articles)
}

/// Read a ranked keyword-weight table.
pub async fn read_keywords(path: &Path) -> Result<Vec<KeywordRecord>, Box<dyn Error>> {
    let raw = fs::read(path).await?;
    let mut rdr = Reader::from_reader(raw.as_slice());
    let mut records = Vec::new();
    for row in rdr.deserialize::<KeywordRecord>() {
        records.push(row?);
    }
    info!(path = %path.display(), rows = records.len(), "Read keyword table");
    Ok(records)
}

/// Write bytes to `path` via a `.tmp` sibling and an atomic rename.
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, path).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OUTLIER_TOPIC;
    use chrono::NaiveDate;

    fn article(title: &str, published: &str, topic: Option<i32>) -> Article {
        Article {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase()),
            published: published.to_string(),
            full_text: "body text".to_string(),
            summary: "a summary".to_string(),
            red_flag_words: "fraud".to_string(),
            red_flag_count: 1,
            topic,
        }
    }

    #[tokio::test]
    async fn test_articles_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("articles.csv");
        let articles = vec![article("One", "2023-01-01", None), article("Two", "", None)];
        write_articles(&articles, &path).await.unwrap();

        let back = read_articles(&path).await.unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].title, "One");
        assert_eq!(back[1].published, "");
        // The plain article table carries no topic column.
        assert_eq!(back[0].topic, None);
    }

    #[tokio::test]
    async fn test_articles_with_topics_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("articles_with_topics.csv");
        let articles = vec![
            article("One", "2023-01-01", Some(0)),
            article("Two", "2023-02-01", Some(OUTLIER_TOPIC)),
        ];
        write_articles_with_topics(&articles, &path).await.unwrap();

        let back = read_articles(&path).await.unwrap();
        assert_eq!(back[0].topic, Some(0));
        assert_eq!(back[1].topic, Some(OUTLIER_TOPIC));
    }

    #[tokio::test]
    async fn test_read_articles_degrades_on_missing_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bare.csv");
        // No published, summary, flag, or topic columns at all.
        std::fs::write(&path, "title,url,full_text\nT,https://e.com/t,body\n").unwrap();

        let back = read_articles(&path).await.unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].published, "");
        assert_eq!(back[0].parsed_date(), None);
        assert_eq!(back[0].topic, None);
        assert_eq!(back[0].red_flag_count, 0);
    }

    #[tokio::test]
    async fn test_keywords_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keywords_weights.csv");
        let records = vec![
            KeywordRecord {
                topic: 0,
                rank: 1,
                keyword: "phishing".to_string(),
                weight: 0.91,
            },
            KeywordRecord {
                topic: 0,
                rank: 2,
                keyword: "phishing".to_string(),
                weight: 0.40,
            },
        ];
        write_keywords(&records, &path).await.unwrap();

        let back = read_keywords(&path).await.unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].rank, 2);
        assert_eq!(back[1].keyword, "phishing");
    }

    #[tokio::test]
    async fn test_keyword_dates_empty_span_serializes_blank() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keywords_with_dates.csv");
        let rows = vec![
            KeywordDates {
                topic: 0,
                rank: 1,
                keyword: "fraud".to_string(),
                weight: 0.5,
                first_date: NaiveDate::from_ymd_opt(2023, 1, 1),
                last_date: NaiveDate::from_ymd_opt(2023, 3, 1),
                doc_count: 2,
            },
            KeywordDates {
                topic: 0,
                rank: 2,
                keyword: "mule".to_string(),
                weight: 0.2,
                first_date: None,
                last_date: None,
                doc_count: 0,
            },
        ];
        write_keyword_dates(&rows, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(
            lines.next().unwrap(),
            "topic,rank,keyword,weight,first_date,last_date,doc_count"
        );
        assert_eq!(lines.next().unwrap(), "0,1,fraud,0.5,2023-01-01,2023-03-01,2");
        assert_eq!(lines.next().unwrap(), "0,2,mule,0.2,,,0");
    }

    #[tokio::test]
    async fn test_topic_overview_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("topics_overview.csv");
        let rows = vec![TopicSummary {
            topic: 0,
            count: 4,
            name: "0_phishing_email_credential".to_string(),
        }];
        write_topic_overview(&rows, &path).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("topic,count,name\n"));
        assert!(raw.contains("0,4,0_phishing_email_credential"));
    }

    #[tokio::test]
    async fn test_write_is_atomic_no_tmp_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("articles.csv");
        write_articles(&[article("One", "", None)], &path).await.unwrap();

        assert!(path.exists());
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/nested/articles.csv");
        write_articles(&[article("One", "", None)], &path).await.unwrap();
        assert!(path.exists());
    }
}
