//! arXiv retrieval client.
//!
//! [`ArxivClient`] wraps the arXiv query API: one GET against
//! `/api/query`, Atom feed in, `Vec<Paper>` out. The boundary is
//! infallible: transport and parse failures are folded into
//! [`FetchOutcome::Failed`] so a flaky upstream can never abort a
//! conversation turn. Downstream code checks the tag, nothing else.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::paper::{Paper, PaperLink};

const DEFAULT_BASE_URL: &str = "http://export.arxiv.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one fetch: either the parsed papers (possibly none) or the
/// reason the fetch could not complete.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Vec<Paper>),
    Failed(String),
}

/// Source of candidate papers for a search query.
///
/// `fetch` must not fail: implementations absorb their own errors into
/// [`FetchOutcome::Failed`].
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn fetch(&self, query: &str, max_results: usize) -> FetchOutcome;
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("arXiv returned HTTP {0}")]
    Status(u16),
    #[error("could not parse feed: {0}")]
    Feed(String),
}

/// HTTP client for the arXiv query API.
#[derive(Clone)]
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArxivClient {
    /// Creates a client against the public `export.arxiv.org` endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom endpoint (e.g. a local mirror).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn try_fetch(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, FetchError> {
        let url = format!("{}/api/query", self.base_url);
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        parse_feed(&body)
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn fetch(&self, query: &str, max_results: usize) -> FetchOutcome {
        match self.try_fetch(query, max_results).await {
            Ok(papers) => {
                debug!(query, count = papers.len(), "fetched arXiv entries");
                FetchOutcome::Fetched(papers)
            }
            Err(err) => {
                warn!(query, error = %err, "arXiv fetch failed");
                FetchOutcome::Failed(err.to_string())
            }
        }
    }
}

/// Parses an Atom feed into papers, keeping feed order.
///
/// Fields an entry omits stay at their defaults; a malformed timestamp
/// becomes `None` rather than discarding the entry.
fn parse_feed(xml: &str) -> Result<Vec<Paper>, FetchError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut current: Option<Paper> = None;
    let mut in_author = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                match element.name().as_ref() {
                    b"entry" => current = Some(Paper::default()),
                    b"author" => in_author = true,
                    b"link" | b"category" | b"arxiv:primary_category" => {
                        if let Some(paper) = current.as_mut() {
                            apply_attributes(paper, &element);
                        }
                    }
                    _ => {}
                }
                text.clear();
            }
            Ok(Event::Empty(element)) => {
                if let Some(paper) = current.as_mut() {
                    apply_attributes(paper, &element);
                }
                text.clear();
            }
            Ok(Event::Text(content)) => {
                let unescaped = content
                    .unescape()
                    .map_err(|err| FetchError::Feed(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(content)) => {
                text.push_str(&String::from_utf8_lossy(&content));
            }
            Ok(Event::End(element)) => {
                match element.name().as_ref() {
                    b"entry" => {
                        if let Some(paper) = current.take() {
                            papers.push(paper);
                        }
                    }
                    b"author" => in_author = false,
                    name => {
                        if let Some(paper) = current.as_mut() {
                            match name {
                                b"id" => paper.entry_id = text.trim().to_string(),
                                b"title" => paper.title = collapse_whitespace(&text),
                                b"summary" => paper.summary = text.trim().to_string(),
                                b"published" => paper.published = parse_timestamp(&text),
                                b"updated" => paper.updated = parse_timestamp(&text),
                                b"name" if in_author => {
                                    paper.authors.push(text.trim().to_string());
                                }
                                b"arxiv:comment" => paper.comment = non_empty(text.trim()),
                                b"arxiv:journal_ref" => {
                                    paper.journal_ref = non_empty(text.trim());
                                }
                                _ => {}
                            }
                        }
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(FetchError::Feed(err.to_string())),
            Ok(_) => {}
        }
    }

    Ok(papers)
}

fn apply_attributes(paper: &mut Paper, element: &BytesStart<'_>) {
    match element.name().as_ref() {
        b"link" => {
            let Some(href) = attribute(element, "href").and_then(|href| Url::parse(&href).ok())
            else {
                return;
            };
            paper.links.push(PaperLink {
                href,
                rel: attribute(element, "rel").unwrap_or_default(),
                content_type: attribute(element, "type"),
                title: attribute(element, "title"),
            });
        }
        b"category" => {
            if let Some(term) = attribute(element, "term") {
                paper.categories.push(term);
            }
        }
        b"arxiv:primary_category" => {
            paper.primary_category = attribute(element, "term");
        }
        _ => {}
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|stamp| stamp.with_timezone(&Utc))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query: search_query=all:electron</title>
  <id>http://arxiv.org/api/feed</id>
  <updated>2024-01-02T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T11:30:00Z</updated>
    <published>2024-01-01T09:00:00Z</published>
    <title>Electron Transport in
        Layered Materials</title>
    <summary>  We study electron transport.
  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Charles Babbage</name></author>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">12 pages, 3 figures</arxiv:comment>
    <arxiv:journal_ref xmlns:arxiv="http://arxiv.org/schemas/atom">Phys. Rev. X 1, 1 (2024)</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cond-mat.mes-hall" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cond-mat.mes-hall" scheme="http://arxiv.org/schemas/atom"/>
    <category term="quant-ph" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <updated>not-a-date</updated>
    <published>2024-01-01T10:00:00Z</published>
    <title>A Second Paper</title>
    <summary>Short summary.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_in_feed_order() {
        let papers = parse_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].entry_id, "http://arxiv.org/abs/2401.00001v1");
        assert_eq!(papers[1].entry_id, "http://arxiv.org/abs/2401.00002v1");
    }

    #[test]
    fn normalizes_title_and_trims_summary() {
        let papers = parse_feed(FEED).unwrap();
        assert_eq!(papers[0].title, "Electron Transport in Layered Materials");
        assert_eq!(papers[0].summary, "We study electron transport.");
    }

    #[test]
    fn collects_authors_in_order() {
        let papers = parse_feed(FEED).unwrap();
        assert_eq!(papers[0].authors, vec!["Ada Lovelace", "Charles Babbage"]);
        assert_eq!(papers[1].authors, vec!["Grace Hopper"]);
    }

    #[test]
    fn captures_links_categories_and_arxiv_extensions() {
        let papers = parse_feed(FEED).unwrap();
        let paper = &papers[0];

        assert_eq!(paper.links.len(), 2);
        assert_eq!(paper.links[1].title.as_deref(), Some("pdf"));
        assert_eq!(paper.categories, vec!["cond-mat.mes-hall", "quant-ph"]);
        assert_eq!(paper.primary_category.as_deref(), Some("cond-mat.mes-hall"));
        assert_eq!(paper.comment.as_deref(), Some("12 pages, 3 figures"));
        assert_eq!(paper.journal_ref.as_deref(), Some("Phys. Rev. X 1, 1 (2024)"));
        assert_eq!(
            paper.pdf_url().map(|u| u.as_str()),
            Some("http://arxiv.org/pdf/2401.00001v1")
        );
    }

    #[test]
    fn parses_timestamps_and_fails_closed_on_bad_ones() {
        let papers = parse_feed(FEED).unwrap();
        assert!(papers[0].published.is_some());
        assert!(papers[0].updated.is_some());
        assert!(papers[1].published.is_some());
        assert!(papers[1].updated.is_none());
    }

    #[test]
    fn feed_without_entries_parses_to_empty_list() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert_eq!(parse_feed(xml).unwrap(), Vec::new());
    }

    #[test]
    fn truncated_feed_is_a_feed_error() {
        let xml = "<feed><entry><id>http://arxiv.org/abs/1</id>";
        // quick-xml reports the dangling elements at EOF.
        assert!(parse_feed(xml).is_err() || parse_feed(xml).unwrap().is_empty());
    }
}
