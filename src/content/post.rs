//! Post models shown on the listing and detail pages

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::{reading_time, RichText};
use crate::cms::{CmsError, Document};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Unique identifier, also the slug of the post page
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

/// One section of a post: a heading followed by rich text
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub heading: String,
    pub body: RichText,
}

fn require_uid(doc: &Document) -> Result<String, CmsError> {
    doc.uid.clone().ok_or_else(|| CmsError::InvalidDocument {
        id: doc.id.clone(),
        reason: "document has no uid".to_string(),
    })
}

impl TryFrom<Document> for PostSummary {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        let data = doc.data;
        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: data.title.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            author: data.author.unwrap_or_default(),
        })
    }
}

impl TryFrom<Document> for PostDetail {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        let data = doc.data;
        let content = data
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|slice| ContentBlock {
                heading: slice.heading.unwrap_or_default(),
                body: slice.body,
            })
            .collect();

        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: data.title.unwrap_or_default(),
            banner_url: data.banner.and_then(|b| b.url),
            author: data.author.unwrap_or_default(),
            content,
        })
    }
}

impl PostDetail {
    /// Estimated minutes to read the whole post
    pub fn reading_time(&self, words_per_minute: usize) -> usize {
        reading_time::reading_time(&self.content, words_per_minute)
    }

    /// Plain text of the first block, for page descriptions
    pub fn lead_text(&self) -> String {
        self.content
            .first()
            .map(|block| block.body.as_text())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::post;

    #[test]
    fn test_summary_from_document() {
        let summary = PostSummary::try_from(post("hooks", "Como utilizar Hooks", 10)).unwrap();
        assert_eq!(summary.uid, "hooks");
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(summary.subtitle, "Sobre Como utilizar Hooks");
        assert_eq!(summary.author, "Joseph Oliveira");
        assert!(summary.first_publication_date.is_some());
    }

    #[test]
    fn test_document_without_uid_is_rejected() {
        let mut doc = post("hooks", "Hooks", 10);
        doc.uid = None;
        let err = PostSummary::try_from(doc.clone()).unwrap_err();
        assert!(matches!(err, CmsError::InvalidDocument { ref id, .. } if id == "id-hooks"));
        assert!(PostDetail::try_from(doc).is_err());
    }

    #[test]
    fn test_detail_from_document() {
        let detail = PostDetail::try_from(post("hooks", "Hooks", 450)).unwrap();
        assert_eq!(detail.banner_url.as_deref(), Some("https://images.test/hooks.png"));
        assert_eq!(detail.content.len(), 1);
        assert_eq!(detail.content[0].heading, "Introdução");
        assert_eq!(detail.reading_time(200), 3);
        assert!(detail.lead_text().starts_with("palavra palavra"));
    }

    #[test]
    fn test_detail_without_content() {
        let mut doc = post("empty", "Empty", 0);
        doc.data.content = None;
        doc.data.banner = None;
        let detail = PostDetail::try_from(doc).unwrap();
        assert!(detail.content.is_empty());
        assert!(detail.banner_url.is_none());
        assert_eq!(detail.reading_time(200), 0);
        assert_eq!(detail.lead_text(), "");
    }
}
