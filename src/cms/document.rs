//! Typed shapes of the CMS responses
//!
//! Responses are decoded straight into these structs; anything that does not
//! fit is reported as [`super::CmsError::Decode`] instead of being passed on.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::content::RichText;

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub total_results_size: usize,
    /// Opaque cursor for the following page, `null` on the last one
    #[serde(default)]
    pub next_page: Option<String>,
    pub results: Vec<Document>,
}

/// A CMS document of the post type
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub data: PostFields,
}

/// The `data` object of a post; every field may be left out by `fetch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub banner: Option<Banner>,
    #[serde(default)]
    pub content: Option<Vec<ContentSlice>>,
}

/// Image field; an empty image is sent as `{}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One entry of the `content` group field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentSlice {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: RichText,
}

mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer};

    /// Accepts RFC 3339 and the `2021-03-15T19:25:28+0000` form the CMS emits
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<FixedOffset>, String> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
            .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))
    }
}
