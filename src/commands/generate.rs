//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::cms::ContentSource;
use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site
pub async fn run(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, source)?;
    let report = generator.generate().await?;

    if !report.skipped.is_empty() {
        tracing::warn!("Skipped {} posts: {:?}", report.skipped.len(), report.skipped);
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} listing pages and {} posts in {:.2}s",
        report.listing_pages,
        report.posts.len(),
        duration.as_secs_f64()
    );

    Ok(report)
}
