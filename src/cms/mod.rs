//! Headless CMS access
//!
//! Everything the blog knows about posts comes from a Prismic-style REST API.
//! The [`ContentSource`] trait is the seam between the pages and that API so
//! one configured client can be shared by the generator, the server and the
//! CLI commands.

mod client;
mod document;
#[cfg(test)]
pub(crate) mod memory;
mod query;

pub use client::PrismicClient;
pub use document::{Banner, ContentSlice, Document, PostFields, SearchPage};
pub use query::{Predicate, Query};

use url::Url;

/// Errors raised while talking to the CMS or decoding its answers
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status error {status} (url: {url})")]
    Status { status: reqwest::StatusCode, url: Url },

    #[error("malformed response from {url}")]
    Decode {
        url: Url,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not advertise a master ref")]
    NoMasterRef(Url),

    #[error("invalid pagination cursor {cursor:?}")]
    InvalidCursor {
        cursor: String,
        #[source]
        source: url::ParseError,
    },

    #[error("pagination cursor {0} points outside the configured CMS")]
    ForeignCursor(Url),

    #[error("document {id} is invalid: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Read access to the documents of the CMS
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page
    async fn query(&self, query: &Query) -> Result<SearchPage, CmsError>;

    /// Look up a single document by its unique identifier
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>, CmsError>;

    /// Follow a `next_page` cursor handed out by a previous search
    async fn fetch_page(&self, cursor: &str) -> Result<SearchPage, CmsError>;
}
