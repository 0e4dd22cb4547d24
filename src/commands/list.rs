//! List the posts published in the CMS

use anyhow::Result;

use crate::cms::{ContentSource, Query};
use crate::helpers::format_date;
use crate::listing::{LoadOutcome, PostListing};
use crate::Blog;

/// Walk every page of the listing and print its posts
pub async fn run(blog: &Blog, source: &dyn ContentSource) -> Result<()> {
    let config = &blog.config;
    let query = Query::of_type(&config.cms.document_type)
        .fetch(config.listing.fields.iter().cloned())
        .page_size(config.listing.page_size);

    let first = source.query(&query).await?;
    // Stop at the page count the CMS announced, or at max_pages if it gave none
    let limit = match first.total_pages {
        0 => config.listing.max_pages,
        total => total,
    };

    let listing = PostListing::from_page(first);
    let mut pages = 1;
    while pages < limit {
        match listing.load_next(source).await? {
            LoadOutcome::Loaded(_) => pages += 1,
            LoadOutcome::Exhausted | LoadOutcome::InFlight => break,
        }
    }
    if listing.has_more() {
        tracing::warn!("Stopped after {} pages, the CMS still reports more", pages);
    }

    let tz = config.tz();
    println!("Posts ({}, {} pages):", listing.len(), pages);
    for post in listing.posts() {
        let date = match post.first_publication_date {
            Some(date) => format_date(&date.with_timezone(&tz), "YYYY-MM-DD", &config.language),
            None => "----------".to_string(),
        };
        println!("  {} - {} by {} [{}]", date, post.title, post.author, post.uid);
    }

    Ok(())
}
