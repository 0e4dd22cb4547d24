//! REST client for a Prismic repository

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{CmsError, ContentSource, Document, Predicate, Query, SearchPage};
use crate::config::CmsConfig;

const USER_AGENT: &str = concat!("spacetraveling/", env!("CARGO_PKG_VERSION"));

/// How long a resolved master ref is reused before asking the API again
const REF_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Content source backed by the CMS REST API
pub struct PrismicClient {
    client: reqwest::Client,
    api_url: Url,
    search_url: Url,
    access_token: Option<String>,
    master_ref: Mutex<Option<(String, Instant)>>,
}

impl PrismicClient {
    /// Build the client described by the `cms` config section
    pub fn from_config(config: &CmsConfig) -> anyhow::Result<Self> {
        let api_url = config.api_url()?;
        let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut search_url = api_url.clone();
        search_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("cms.api_url cannot be a base URL"))?
            .pop_if_empty()
            .extend(["documents", "search"]);

        Ok(Self {
            client,
            api_url,
            search_url,
            access_token: config.access_token.clone(),
            master_ref: Mutex::new(None),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        tracing::debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CmsError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CmsError::Status { status, url });
        }

        let body = resp.bytes().await.map_err(|source| CmsError::Transport {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| CmsError::Decode { url, source })
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            let present = url.query_pairs().any(|(k, _)| k == "access_token");
            if !present {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    async fn master_ref(&self) -> Result<String, CmsError> {
        if let Some((reference, fetched_at)) = self.cached_ref() {
            if fetched_at.elapsed() < REF_TTL {
                return Ok(reference);
            }
        }

        let info: ApiInfo = self.get_json(self.with_token(self.api_url.clone())).await?;
        let reference = info
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| CmsError::NoMasterRef(self.api_url.clone()))?;

        if let Ok(mut cached) = self.master_ref.lock() {
            *cached = Some((reference.clone(), Instant::now()));
        }
        Ok(reference)
    }

    fn cached_ref(&self) -> Option<(String, Instant)> {
        self.master_ref.lock().ok().and_then(|cached| cached.clone())
    }

    async fn search_url_for(&self, query: &Query) -> Result<Url, CmsError> {
        let reference = self.master_ref().await?;
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(self.with_token(url))
    }

    /// Parse a cursor and make sure it points back at the configured API
    pub fn cursor_url(&self, cursor: &str) -> Result<Url, CmsError> {
        let url = Url::parse(cursor).map_err(|source| CmsError::InvalidCursor {
            cursor: cursor.to_string(),
            source,
        })?;
        if url.origin() != self.api_url.origin() {
            return Err(CmsError::ForeignCursor(url));
        }
        Ok(self.with_token(url))
    }
}

#[async_trait::async_trait]
impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<SearchPage, CmsError> {
        let url = self.search_url_for(query).await?;
        self.get_json(url).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>, CmsError> {
        let query = Query::of_type(doc_type)
            .predicate(Predicate::at(format!("my.{}.uid", doc_type), uid))
            .page_size(1);
        let page = self.query(&query).await?;
        Ok(page.results.into_iter().next())
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchPage, CmsError> {
        let url = self.cursor_url(cursor)?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> PrismicClient {
        let config = CmsConfig {
            api_url: "https://blog.cdn.prismic.io/api/v2".to_string(),
            access_token: token.map(str::to_string),
            ..CmsConfig::default()
        };
        PrismicClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_cursor_on_same_origin_is_accepted() {
        let client = client(None);
        let url = client
            .cursor_url("https://blog.cdn.prismic.io/api/v2/documents/search?page=2")
            .unwrap();
        assert_eq!(url.query(), Some("page=2"));
    }

    #[test]
    fn test_foreign_cursor_is_refused() {
        let client = client(None);
        let err = client
            .cursor_url("https://evil.example.com/api/v2/documents/search?page=2")
            .unwrap_err();
        assert!(matches!(err, CmsError::ForeignCursor(_)));

        let err = client.cursor_url("not a url").unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor { .. }));
    }

    #[test]
    fn test_access_token_added_once() {
        let client = client(Some("secret"));
        let url = client
            .cursor_url("https://blog.cdn.prismic.io/api/v2/documents/search?page=2")
            .unwrap();
        assert_eq!(url.query(), Some("page=2&access_token=secret"));

        let url = client
            .cursor_url("https://blog.cdn.prismic.io/api/v2/documents/search?access_token=secret")
            .unwrap();
        assert_eq!(url.query(), Some("access_token=secret"));
    }

    #[test]
    fn test_search_endpoint() {
        let client = client(None);
        assert_eq!(
            client.search_url.as_str(),
            "https://blog.cdn.prismic.io/api/v2/documents/search"
        );
    }

    #[test]
    fn test_master_ref_decoding() {
        let info: ApiInfo = serde_json::from_str(
            r#"{"refs": [
                {"id": "preview", "ref": "Xabc", "label": "Preview"},
                {"id": "master", "ref": "YE-master", "label": "Master", "isMasterRef": true}
            ]}"#,
        )
        .unwrap();
        let master = info.refs.iter().find(|r| r.is_master_ref).unwrap();
        assert_eq!(master.reference, "YE-master");
    }
}
