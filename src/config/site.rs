//! Site configuration (_config.yml)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,
    pub logo: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub post: PostConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            logo: "/logo.svg".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            post: PostConfig::default(),
            reading: ReadingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.cms.api_url()?;
        if self.listing.page_size == 0 {
            bail!("listing.page_size must be at least 1");
        }
        if self.listing.max_pages == 0 {
            bail!("listing.max_pages must be at least 1");
        }
        if self.post.prerender_page_size == 0 {
            bail!("post.prerender_page_size must be at least 1");
        }
        if self.post.redirect_cache_size == 0 {
            bail!("post.redirect_cache_size must be at least 1");
        }
        if self.reading.words_per_minute == 0 {
            bail!("reading.words_per_minute must be at least 1");
        }
        Ok(())
    }

    /// Timezone used when displaying publication dates
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub api_url: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

impl CmsConfig {
    /// Parsed API entry point; must be an absolute http(s) URL
    pub fn api_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("cms.api_url is not a valid URL: {:?}", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("cms.api_url must use http or https: {:?}", self.api_url);
        }
        Ok(url)
    }
}

/// Home page listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
    pub fields: Vec<String>,
    pub max_pages: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 2,
            fields: vec![
                "posts.title".to_string(),
                "posts.subtitle".to_string(),
                "posts.author".to_string(),
            ],
            max_pages: 20,
        }
    }
}

/// What to do with a post slug that was not generated ahead of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Serve a loading page while the post is resolved in the background
    Loading,
    /// Resolve the post before answering the request
    Blocking,
    /// Unknown slugs are not found
    Disabled,
}

/// Post page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub revalidate_secs: u64,
    pub fallback: FallbackMode,
    pub prerender_page_size: usize,
    /// Missing slugs whose redirect is remembered by the server
    pub redirect_cache_size: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 30 * 60,
            fallback: FallbackMode::Loading,
            prerender_page_size: 20,
            redirect_cache_size: 1024,
        }
    }
}

/// Reading time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
        }
    }
}
