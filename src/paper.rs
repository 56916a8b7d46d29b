//! The retrieved-paper record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A link attached to a paper entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperLink {
    pub href: Url,
    /// Relation tag (`alternate`, `related`, ...); empty when the feed
    /// omitted it.
    pub rel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One retrieved paper and its metadata.
///
/// Papers are created by the retrieval client from a single feed entry and
/// are immutable afterwards; they live only for the turn that fetched them.
/// Fields the feed did not supply hold their documented defaults (empty
/// string, empty list, or `None`) rather than failing the whole entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Entry identifier, the full `http://arxiv.org/abs/...` URL.
    pub entry_id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub links: Vec<PaperLink>,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    pub journal_ref: Option<String>,
    pub primary_category: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Paper {
    /// Creates a paper with the three fields every non-empty entry carries.
    pub fn new(
        entry_id: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            title: title.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// The PDF link, when the feed provided one.
    pub fn pdf_url(&self) -> Option<&Url> {
        self.links
            .iter()
            .find(|link| {
                link.title.as_deref() == Some("pdf")
                    || link.content_type.as_deref() == Some("application/pdf")
            })
            .map(|link| &link.href)
    }

    /// The human-readable abstract page, rewritten from the entry id.
    pub fn abstract_url(&self) -> Option<String> {
        if self.entry_id.is_empty() {
            return None;
        }
        let id = self
            .entry_id
            .rsplit('/')
            .next()
            .unwrap_or(self.entry_id.as_str());
        Some(format!("https://arxiv.org/abs/{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str, rel: &str, content_type: Option<&str>, title: Option<&str>) -> PaperLink {
        PaperLink {
            href: Url::parse(href).unwrap(),
            rel: rel.to_string(),
            content_type: content_type.map(str::to_string),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn pdf_url_prefers_pdf_titled_link() {
        let mut paper = Paper::new("http://arxiv.org/abs/2301.00001v1", "T", "S");
        paper.links = vec![
            link("http://arxiv.org/abs/2301.00001v1", "alternate", None, None),
            link(
                "http://arxiv.org/pdf/2301.00001v1",
                "related",
                Some("application/pdf"),
                Some("pdf"),
            ),
        ];

        assert_eq!(
            paper.pdf_url().map(Url::as_str),
            Some("http://arxiv.org/pdf/2301.00001v1")
        );
    }

    #[test]
    fn pdf_url_matches_on_content_type_alone() {
        let mut paper = Paper::new("http://arxiv.org/abs/2301.00001v1", "T", "S");
        paper.links = vec![link(
            "http://arxiv.org/pdf/2301.00001v1",
            "related",
            Some("application/pdf"),
            None,
        )];

        assert!(paper.pdf_url().is_some());
    }

    #[test]
    fn pdf_url_is_none_without_matching_link() {
        let paper = Paper::new("http://arxiv.org/abs/2301.00001v1", "T", "S");
        assert!(paper.pdf_url().is_none());
    }

    #[test]
    fn abstract_url_is_rewritten_from_entry_id() {
        let paper = Paper::new("http://arxiv.org/abs/2301.00001v1", "T", "S");
        assert_eq!(
            paper.abstract_url().as_deref(),
            Some("https://arxiv.org/abs/2301.00001v1")
        );
    }

    #[test]
    fn abstract_url_is_none_for_empty_entry_id() {
        let paper = Paper::default();
        assert!(paper.abstract_url().is_none());
    }
}
