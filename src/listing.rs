//! Post listing that grows one CMS page at a time
//!
//! The listing starts from the first search page and follows the `next_page`
//! cursor on demand. Only one "load next" can be outstanding; extra triggers
//! while a fetch is running are ignored so the list is never extended twice
//! with the same page.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::cms::{CmsError, ContentSource, SearchPage};
use crate::content::PostSummary;

/// Result of a [`PostListing::load_next`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended with this many posts
    Loaded(usize),
    /// There is no cursor left to follow
    Exhausted,
    /// Another load is still running; nothing was done
    InFlight,
}

#[derive(Debug, Default)]
struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
}

/// Accumulated listing state
#[derive(Debug, Default)]
pub struct PostListing {
    state: Mutex<ListingState>,
    loading: AtomicBool,
}

/// Clears the in-flight flag when the load finishes or is dropped
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Posts of a search page; documents without a uid cannot be linked and are left out
fn summaries(page: SearchPage) -> (Vec<PostSummary>, Option<String>) {
    let posts = page
        .results
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match PostSummary::try_from(doc) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Document {} left out of the listing: {}", id, e);
                    None
                }
            }
        })
        .collect();
    (posts, page.next_page)
}

impl PostListing {
    pub fn new(posts: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self {
            state: Mutex::new(ListingState { posts, next_page }),
            loading: AtomicBool::new(false),
        }
    }

    /// Start a listing from the first search page
    pub fn from_page(page: SearchPage) -> Self {
        let (posts, next_page) = summaries(page);
        Self::new(posts, next_page)
    }

    fn state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn posts(&self) -> Vec<PostSummary> {
        self.state().posts.clone()
    }

    pub fn len(&self) -> usize {
        self.state().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().posts.is_empty()
    }

    pub fn next_page(&self) -> Option<String> {
        self.state().next_page.clone()
    }

    /// Whether "load next" can do anything
    pub fn has_more(&self) -> bool {
        self.state().next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Fetch the page behind the cursor and append it
    ///
    /// On error the posts and the cursor are left as they were.
    pub async fn load_next(&self, source: &dyn ContentSource) -> Result<LoadOutcome, CmsError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Load already in flight, ignoring");
            return Ok(LoadOutcome::InFlight);
        }
        let _guard = LoadingGuard(&self.loading);

        let Some(cursor) = self.next_page() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let (posts, next_page) = summaries(source.fetch_page(&cursor).await?);
        let added = posts.len();

        let mut state = self.state();
        state.posts.extend(posts);
        state.next_page = next_page;
        tracing::debug!(
            "Loaded {} more posts ({} total, more: {})",
            added,
            state.posts.len(),
            state.next_page.is_some()
        );

        Ok(LoadOutcome::Loaded(added))
    }

    /// Follow cursors until `pages` pages are loaded or the list ends
    pub async fn load_pages(
        &self,
        source: &dyn ContentSource,
        pages: usize,
    ) -> Result<usize, CmsError> {
        let mut loaded = 1;
        while loaded < pages {
            match self.load_next(source).await? {
                LoadOutcome::Loaded(_) => loaded += 1,
                LoadOutcome::Exhausted | LoadOutcome::InFlight => break,
            }
        }
        Ok(loaded)
    }

    pub fn into_parts(self) -> (Vec<PostSummary>, Option<String>) {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (state.posts, state.next_page)
    }
}
