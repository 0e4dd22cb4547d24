//! In-memory content source for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    Banner, CmsError, ContentSource, ContentSlice, Document, PostFields, Predicate, Query,
    SearchPage,
};
use crate::content::{RichText, RichTextNode};

const CURSOR_PREFIX: &str = "https://cms.test/api/v2/documents/search?page=";

/// Serves a fixed list of documents, paginated like the real API
pub struct MemorySource {
    documents: Mutex<Vec<Document>>,
    page_size: usize,
    delay: Option<Duration>,
    fail: Mutex<bool>,
    pub cursor_fetches: AtomicUsize,
    pub uid_lookups: AtomicUsize,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>, page_size: usize) -> Self {
        Self {
            documents: Mutex::new(documents),
            page_size,
            delay: None,
            fail: Mutex::new(false),
            cursor_fetches: AtomicUsize::new(0),
            uid_lookups: AtomicUsize::new(0),
        }
    }

    /// Make every call wait before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every following call fail with an HTTP 503
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    pub fn set_title(&self, uid: &str, title: &str) {
        let mut documents = self.documents.lock().unwrap();
        for doc in documents.iter_mut() {
            if doc.uid.as_deref() == Some(uid) {
                doc.data.title = Some(title.to_string());
            }
        }
    }

    fn page(&self, page: usize, size: usize) -> SearchPage {
        let documents = self.documents.lock().unwrap();
        let start = (page - 1) * size;
        let results: Vec<Document> = documents.iter().skip(start).take(size).cloned().collect();
        let total_pages = documents.len().div_ceil(size);
        let next_page = if start + size < documents.len() {
            Some(format!("{}{}&pageSize={}", CURSOR_PREFIX, page + 1, size))
        } else {
            None
        };
        SearchPage {
            page,
            total_pages,
            total_results_size: documents.len(),
            next_page,
            results,
        }
    }

    async fn pause(&self) -> Result<(), CmsError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock().unwrap() {
            return Err(CmsError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: url::Url::parse("https://cms.test/api/v2").unwrap(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentSource for MemorySource {
    async fn query(&self, query: &Query) -> Result<SearchPage, CmsError> {
        self.pause().await?;
        let size = query.page_size.unwrap_or(self.page_size);
        let page = query.page.unwrap_or(1);
        let mut result = self.page(page, size);
        let wanted_type = query.predicates.iter().find_map(|p| match p {
            Predicate::At { path, value } if path == "document.type" => Some(value.clone()),
            _ => None,
        });
        if let Some(doc_type) = wanted_type {
            result.results.retain(|d| d.doc_type == doc_type);
        }
        Ok(result)
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>, CmsError> {
        self.uid_lookups.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchPage, CmsError> {
        self.cursor_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        let parsed = url::Url::parse(cursor).map_err(|source| CmsError::InvalidCursor {
            cursor: cursor.to_string(),
            source,
        })?;
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let page = param("page").unwrap_or(1);
        let size = param("pageSize").unwrap_or(self.page_size);
        Ok(self.page(page, size))
    }
}

/// A paragraph node with the given text
pub fn paragraph(text: &str) -> RichTextNode {
    serde_json::from_value(serde_json::json!({
        "type": "paragraph",
        "text": text,
        "spans": []
    }))
    .unwrap()
}

/// A post document with one content section of `words` words
pub fn post(uid: &str, title: &str, words: usize) -> Document {
    let text = vec!["palavra"; words].join(" ");
    Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: chrono::DateTime::parse_from_rfc3339("2021-03-15T19:25:28+00:00")
            .ok(),
        data: PostFields {
            title: Some(title.to_string()),
            subtitle: Some(format!("Sobre {}", title)),
            author: Some("Joseph Oliveira".to_string()),
            banner: Some(Banner {
                url: Some(format!("https://images.test/{}.png", uid)),
                alt: None,
            }),
            content: Some(vec![ContentSlice {
                heading: Some("Introdução".to_string()),
                body: RichText(vec![paragraph(&text)]),
            }]),
        },
    }
}
