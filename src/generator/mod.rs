//! Generator module - renders the blog pages with the built-in Tera templates
//!
//! The same generator backs both outputs: `generate` writes every page into the
//! public directory, while the server asks it for single pages on demand.

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::Context;
use walkdir::WalkDir;

use crate::cms::{ContentSource, Query};
use crate::config::SiteConfig;
use crate::content::{resolve_post, PostDetail, Resolution};
use crate::helpers::{is_safe_slug, listing_url};
use crate::listing::{LoadOutcome, PostListing};
use crate::templates::{Labels, ListingData, PostCard, PostPageData, SiteData, TemplateRenderer};
use crate::Blog;

/// Seconds between reloads of the loading page
const LOADING_REFRESH_SECS: u64 = 1;

/// What a full generation produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Listing pages written
    pub listing_pages: usize,
    /// Post pages written
    pub posts: Vec<String>,
    /// Known slugs that produced no page
    pub skipped: Vec<String>,
}

/// Page generator using Tera templates
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        blog.config.validate()?;
        let renderer = TemplateRenderer::new(&blog.config)?;

        Ok(Self {
            blog: blog.clone(),
            source,
            renderer,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.blog.config
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&self.blog.config));
        context.insert("labels", &Labels::for_language(&self.blog.config.language));
        context
    }

    fn listing_query(&self) -> Query {
        let listing = &self.blog.config.listing;
        Query::of_type(&self.blog.config.cms.document_type)
            .fetch(listing.fields.iter().cloned())
            .page_size(listing.page_size)
    }

    /// Fetch the first page of the listing and follow the cursor until
    /// `pages` pages are loaded
    pub async fn fetch_listing(&self, pages: usize) -> Result<PostListing> {
        let first = self.source.query(&self.listing_query()).await?;
        let listing = PostListing::from_page(first);
        let pages = pages.clamp(1, self.blog.config.listing.max_pages);
        listing.load_pages(self.source.as_ref(), pages).await?;
        Ok(listing)
    }

    /// Render the listing showing its first `pages` pages
    pub fn render_listing(&self, listing: &PostListing, pages: usize) -> Result<String> {
        let posts: Vec<PostCard> = listing.posts().iter().map(PostCard::from).collect();

        let next_link = if listing.has_more() && pages < self.blog.config.listing.max_pages {
            Some(format!("{}#post-{}", listing_url(pages + 1), posts.len()))
        } else {
            None
        };

        let mut context = self.create_base_context();
        context.insert("listing", &ListingData { posts, next_link });
        self.renderer.render("index.html", &context)
    }

    /// Slugs of the posts generated ahead of time
    pub async fn known_slugs(&self) -> Result<Vec<String>> {
        let query = Query::of_type(&self.blog.config.cms.document_type)
            .page_size(self.blog.config.post.prerender_page_size);
        let page = self.source.query(&query).await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(|doc| {
                if doc.uid.is_none() {
                    tracing::warn!("Document {} has no uid, not generating it", doc.id);
                }
                doc.uid
            })
            .collect())
    }

    /// Look up one post
    pub async fn resolve(&self, slug: &str) -> Result<Resolution> {
        let resolution =
            resolve_post(self.source.as_ref(), &self.blog.config.cms.document_type, slug)
                .await
                .with_context(|| format!("Failed to resolve post {:?}", slug))?;
        Ok(resolution)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let data = PostPageData::new(post, self.blog.config.reading.words_per_minute);
        let mut context = self.create_base_context();
        context.insert("post", &data);
        self.renderer.render("post.html", &context)
    }

    /// Render the page shown while a post is still being resolved
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    /// Generate the entire site into the public directory
    pub async fn generate(&self) -> Result<GenerateReport> {
        let mut report = GenerateReport::default();

        // Ensure public directory exists
        fs::create_dir_all(&self.blog.public_dir)?;

        // Copy static assets (logo, images...)
        self.copy_static_assets()?;

        self.generate_listing_pages(&mut report).await?;
        self.generate_post_pages(&mut report).await?;

        Ok(report)
    }

    /// Generate `index.html` and one cumulative page per "load more" step
    async fn generate_listing_pages(&self, report: &mut GenerateReport) -> Result<()> {
        let listing = self.fetch_listing(1).await?;
        let max_pages = self.blog.config.listing.max_pages;
        let mut pages = 1;

        loop {
            let html = self.render_listing(&listing, pages)?;
            self.write_page(&listing_path(pages), &html)?;
            report.listing_pages += 1;

            if pages >= max_pages {
                break;
            }
            match listing.load_next(self.source.as_ref()).await? {
                LoadOutcome::Loaded(_) => pages += 1,
                LoadOutcome::Exhausted | LoadOutcome::InFlight => break,
            }
        }

        tracing::info!(
            "Generated {} listing pages with {} posts",
            report.listing_pages,
            listing.len()
        );
        Ok(())
    }

    /// Generate a page for every known slug
    async fn generate_post_pages(&self, report: &mut GenerateReport) -> Result<()> {
        for slug in self.known_slugs().await? {
            if !is_safe_slug(&slug) {
                tracing::warn!("Skipping post with unusable slug {:?}", slug);
                report.skipped.push(slug);
                continue;
            }

            match self.resolve(&slug).await? {
                Resolution::Found(post) => {
                    let html = self.render_post(&post)?;
                    self.write_page(&Path::new("post").join(&slug).join("index.html"), &html)?;
                    tracing::debug!("Generated post: {}", slug);
                    report.posts.push(slug);
                }
                Resolution::Redirect { .. } => {
                    tracing::warn!("Post {:?} vanished while generating", slug);
                    report.skipped.push(slug);
                }
            }
        }

        tracing::info!("Generated {} post pages", report.posts.len());
        Ok(())
    }

    fn write_page(&self, relative: &Path, html: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy static assets (logo, images, etc.) to public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() {
                let relative = path.strip_prefix(static_dir)?;
                let dest = self.blog.public_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::copy(path, &dest)?;
            }
        }

        Ok(())
    }
}

/// Output file of the listing showing `pages` pages
fn listing_path(pages: usize) -> PathBuf {
    if pages <= 1 {
        PathBuf::from("index.html")
    } else {
        Path::new("page").join(pages.to_string()).join("index.html")
    }
}
