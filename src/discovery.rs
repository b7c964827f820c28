//! Sitemap-driven discovery of candidate article URLs.
//!
//! Discovery fetches the site's sitemap listing, follows one level of
//! `<sitemapindex>` nesting, and filters page URLs down to likely blog posts:
//! a URL qualifies when it matches at least one configured path hint and no
//! exclusion pattern (tag/category/author/pagination listings). Duplicates are
//! dropped preserving first-seen order, and the result is capped at a
//! configurable maximum.
//!
//! A missing or unreadable sitemap is not an error — discovery returns an
//! empty list and the pipeline reports "no candidates" and ends cleanly.

use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Sitemap paths probed under the site root, in order.
const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// Upper bound on child sitemaps fetched from a sitemap index.
const MAX_CHILD_SITEMAPS: usize = 25;

/// Filtering rules for candidate URLs.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// A URL must contain at least one of these path fragments.
    pub path_hints: Vec<String>,
    /// A URL containing any of these fragments is dropped.
    pub exclude_patterns: Vec<String>,
    /// Maximum number of candidates returned.
    pub max_urls: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            path_hints: vec!["/blog/".to_string(), "/fraud-and-payment-blog".to_string()],
            exclude_patterns: vec![
                "/tag/".to_string(),
                "/category/".to_string(),
                "/author/".to_string(),
                "/page/".to_string(),
            ],
            max_urls: 150,
        }
    }
}

/// One parsed sitemap document: either a page listing or an index of
/// further sitemaps.
#[derive(Debug)]
pub struct SitemapPage {
    pub is_index: bool,
    pub locs: Vec<String>,
}

/// Parse the `<loc>` entries out of a sitemap XML document.
///
/// Handles both `<urlset>` listings and `<sitemapindex>` indexes; the caller
/// distinguishes them via [`SitemapPage::is_index`].
pub fn parse_sitemap(xml: &str) -> Result<SitemapPage, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    let mut root: Option<String> = None;
    let mut in_loc = false;
    let mut buf = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if root.is_none() {
                    root = Some(name.clone());
                }
                if name == "loc" {
                    in_loc = true;
                    buf.clear();
                }
            }
            Event::Text(t) if in_loc => {
                buf.push_str(&t.decode()?);
            }
            Event::GeneralRef(r) if in_loc => {
                let raw = format!("&{};", r.decode()?);
                buf.push_str(&quick_xml::escape::unescape(&raw)?);
            }
            Event::CData(t) if in_loc => {
                buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let s = buf.trim().to_string();
                    if !s.is_empty() {
                        locs.push(s);
                    }
                    buf.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(SitemapPage {
        is_index: root.as_deref() == Some("sitemapindex"),
        locs,
    })
}

/// Whether a URL looks like an article page rather than a listing.
pub fn looks_like_post(url: &str, cfg: &DiscoveryConfig) -> bool {
    let lower = url.to_lowercase();
    if cfg.exclude_patterns.iter().any(|p| lower.contains(p)) {
        return false;
    }
    cfg.path_hints.iter().any(|h| lower.contains(h))
}

/// Filter, deduplicate (first-seen order), and cap a raw URL listing.
pub fn filter_candidates(urls: Vec<String>, cfg: &DiscoveryConfig) -> Vec<String> {
    urls.into_iter()
        .filter(|u| looks_like_post(u, cfg))
        .unique()
        .take(cfg.max_urls)
        .collect()
}

/// Discover candidate article URLs from a site's sitemap listing.
///
/// Probes the standard sitemap paths under `site_root`, following a sitemap
/// index one level deep. Fetch and parse failures are logged and produce an
/// empty result, never an error; only a malformed `site_root` itself fails.
#[instrument(level = "info", skip(cfg))]
pub async fn discover(
    site_root: &str,
    cfg: &DiscoveryConfig,
) -> Result<Vec<String>, Box<dyn Error>> {
    let base = Url::parse(site_root)?;

    let mut page_urls: Vec<String> = Vec::new();
    for path in SITEMAP_PATHS {
        let sitemap_url = base.join(path)?;
        let Some(xml) = fetch_text(sitemap_url.as_str()).await else {
            continue;
        };
        match parse_sitemap(&xml) {
            Ok(page) if page.is_index => {
                info!(children = page.locs.len(), sitemap = %sitemap_url, "Sitemap index found");
                for child in page.locs.iter().take(MAX_CHILD_SITEMAPS) {
                    let Some(child_xml) = fetch_text(child).await else {
                        continue;
                    };
                    match parse_sitemap(&child_xml) {
                        Ok(p) if !p.is_index => page_urls.extend(p.locs),
                        Ok(_) => debug!(%child, "Skipping nested sitemap index"),
                        Err(e) => warn!(error = %e, %child, "Failed to parse child sitemap"),
                    }
                }
            }
            Ok(page) => page_urls.extend(page.locs),
            Err(e) => warn!(error = %e, sitemap = %sitemap_url, "Failed to parse sitemap"),
        }
        if !page_urls.is_empty() {
            break;
        }
    }

    let candidates = filter_candidates(page_urls, cfg);
    info!(
        count = candidates.len(),
        site = site_root,
        "Discovered candidate article URLs"
    );
    debug!(urls = ?candidates, "Candidate URLs");
    Ok(candidates)
}

async fn fetch_text(url: &str) -> Option<String> {
    let resp = match reqwest::get(url).await.and_then(|r| r.error_for_status()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, %url, "Sitemap fetch failed");
            return None;
        }
    };
    match resp.text().await {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(error = %e, %url, "Sitemap body read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/blog/post-one</loc></url>
  <url><loc>https://example.com/blog/post-two</loc><lastmod>2023-05-01</lastmod></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>https://example.com/page-sitemap.xml</loc></sitemap>
</sitemapindex>"#;

    #[test]
    fn test_parse_sitemap_urlset() {
        let page = parse_sitemap(URLSET).unwrap();
        assert!(!page.is_index);
        assert_eq!(page.locs.len(), 3);
        assert_eq!(page.locs[0], "https://example.com/blog/post-one");
    }

    #[test]
    fn test_parse_sitemap_index() {
        let page = parse_sitemap(INDEX).unwrap();
        assert!(page.is_index);
        assert_eq!(page.locs.len(), 2);
    }

    #[test]
    fn test_parse_sitemap_unescapes_entities() {
        let xml = r#"<urlset><url><loc>https://example.com/blog/a?x=1&amp;y=2</loc></url></urlset>"#;
        let page = parse_sitemap(xml).unwrap();
        assert_eq!(page.locs, vec!["https://example.com/blog/a?x=1&y=2"]);
    }

    #[test]
    fn test_parse_sitemap_cdata_loc() {
        let xml = r#"<urlset><url><loc><![CDATA[https://example.com/blog/b]]></loc></url></urlset>"#;
        let page = parse_sitemap(xml).unwrap();
        assert_eq!(page.locs, vec!["https://example.com/blog/b"]);
    }

    #[test]
    fn test_looks_like_post_requires_hint() {
        let cfg = DiscoveryConfig::default();
        assert!(looks_like_post("https://example.com/blog/how-scams-work", &cfg));
        assert!(looks_like_post(
            "https://example.com/fraud-and-payment-blog/trends",
            &cfg
        ));
        assert!(!looks_like_post("https://example.com/careers", &cfg));
    }

    #[test]
    fn test_looks_like_post_exclusions_win() {
        let cfg = DiscoveryConfig::default();
        assert!(!looks_like_post("https://example.com/blog/tag/fraud", &cfg));
        assert!(!looks_like_post("https://example.com/blog/category/news", &cfg));
        assert!(!looks_like_post("https://example.com/blog/author/jane", &cfg));
        assert!(!looks_like_post("https://example.com/blog/page/2", &cfg));
    }

    #[test]
    fn test_looks_like_post_case_insensitive() {
        let cfg = DiscoveryConfig::default();
        assert!(looks_like_post("https://example.com/Blog/Post", &cfg));
        assert!(!looks_like_post("https://example.com/Blog/Tag/x", &cfg));
    }

    #[test]
    fn test_filter_candidates_dedupes_preserving_order() {
        let cfg = DiscoveryConfig::default();
        let urls = vec![
            "https://example.com/blog/b".to_string(),
            "https://example.com/blog/a".to_string(),
            "https://example.com/blog/b".to_string(),
            "https://example.com/pricing".to_string(),
        ];
        let out = filter_candidates(urls, &cfg);
        assert_eq!(
            out,
            vec![
                "https://example.com/blog/b".to_string(),
                "https://example.com/blog/a".to_string(),
            ]
        );
    }

    #[test]
    fn test_filter_candidates_caps_at_max() {
        let cfg = DiscoveryConfig {
            max_urls: 2,
            ..DiscoveryConfig::default()
        };
        let urls = (0..5)
            .map(|i| format!("https://example.com/blog/post-{i}"))
            .collect();
        let out = filter_candidates(urls, &cfg);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "https://example.com/blog/post-0");
    }

    #[test]
    fn test_filter_candidates_empty_input() {
        let cfg = DiscoveryConfig::default();
        assert!(filter_candidates(Vec::new(), &cfg).is_empty());
    }
}
