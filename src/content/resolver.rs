//! Resolve a post page from its slug

use super::PostDetail;
use crate::cms::{CmsError, ContentSource};

/// Outcome of looking up a post page
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Box<PostDetail>),
    /// The slug matches no document; send the reader elsewhere
    Redirect { location: &'static str, permanent: bool },
}

impl Resolution {
    /// Non-permanent redirect back to the listing
    pub fn to_listing() -> Self {
        Resolution::Redirect {
            location: "/",
            permanent: false,
        }
    }
}

/// Fetch the document with uid `slug` and turn it into a post
pub async fn resolve_post(
    source: &dyn ContentSource,
    doc_type: &str,
    slug: &str,
) -> Result<Resolution, CmsError> {
    match source.get_by_uid(doc_type, slug).await? {
        Some(doc) => {
            tracing::debug!("Resolved post {}", slug);
            Ok(Resolution::Found(Box::new(PostDetail::try_from(doc)?)))
        }
        None => {
            tracing::info!("No post with uid {:?}, redirecting to the listing", slug);
            Ok(Resolution::to_listing())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::{post, MemorySource};

    #[tokio::test]
    async fn test_known_slug_is_found() {
        let source = MemorySource::new(vec![post("hooks", "Hooks", 10)], 2);
        match resolve_post(&source, "posts", "hooks").await.unwrap() {
            Resolution::Found(detail) => assert_eq!(detail.title, "Hooks"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_slug_redirects_temporarily() {
        let source = MemorySource::new(vec![post("hooks", "Hooks", 10)], 2);
        let resolution = resolve_post(&source, "posts", "nope").await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Redirect {
                location: "/",
                permanent: false
            }
        );
    }

    #[tokio::test]
    async fn test_wrong_type_is_not_found() {
        let source = MemorySource::new(vec![post("hooks", "Hooks", 10)], 2);
        let resolution = resolve_post(&source, "pages", "hooks").await.unwrap();
        assert_eq!(resolution, Resolution::to_listing());
    }

    #[tokio::test]
    async fn test_cms_failure_is_an_error() {
        let source = MemorySource::new(vec![post("hooks", "Hooks", 10)], 2);
        source.set_failing(true);
        assert!(resolve_post(&source, "posts", "hooks").await.is_err());
    }
}
