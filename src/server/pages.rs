//! Rendered post pages kept by the server between requests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A page ready to be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltPage {
    Html(Arc<str>),
    Redirect {
        location: &'static str,
        permanent: bool,
    },
}

#[derive(Debug)]
enum Entry {
    /// First resolution still running
    Pending,
    Built {
        page: BuiltPage,
        generated_at: Instant,
        refreshing: bool,
    },
}

/// Result of looking a slug up in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Serve this page as is
    Serve(BuiltPage),
    /// Serve this stale page; the caller now owns its regeneration
    Revalidate(BuiltPage),
    /// Being resolved for the first time
    Pending,
    /// Never seen
    Missing,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Slugs whose page is a redirect, oldest first
    redirects: VecDeque<String>,
}

impl Inner {
    fn forget_redirect(&mut self, slug: &str) {
        self.redirects.retain(|s| s != slug);
    }
}

/// Pages by slug with time based revalidation
///
/// Redirects are kept for at most `redirect_limit` slugs; past that the
/// oldest ones are evicted and resolved again on their next request.
pub struct PageStore {
    inner: Mutex<Inner>,
    revalidate: Duration,
    redirect_limit: usize,
}

impl PageStore {
    pub fn new(revalidate: Duration, redirect_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            revalidate,
            redirect_limit,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look a slug up
    ///
    /// A stale page is handed out as `Revalidate` to exactly one caller until
    /// `insert` or `fail` is called for it; everyone else keeps getting it as
    /// `Serve`.
    pub fn lookup(&self, slug: &str) -> Lookup {
        let mut inner = self.inner();
        match inner.entries.get_mut(slug) {
            None => Lookup::Missing,
            Some(Entry::Pending) => Lookup::Pending,
            Some(Entry::Built {
                page,
                generated_at,
                refreshing,
            }) => {
                if !*refreshing && generated_at.elapsed() >= self.revalidate {
                    *refreshing = true;
                    Lookup::Revalidate(page.clone())
                } else {
                    Lookup::Serve(page.clone())
                }
            }
        }
    }

    /// Mark a slug as being resolved for the first time
    ///
    /// Returns false when the slug is already known, in which case the caller
    /// must not start another resolution.
    pub fn begin(&self, slug: &str) -> bool {
        let mut inner = self.inner();
        if inner.entries.contains_key(slug) {
            return false;
        }
        inner.entries.insert(slug.to_string(), Entry::Pending);
        true
    }

    /// Store a freshly generated page
    pub fn insert(&self, slug: &str, page: BuiltPage) {
        let mut inner = self.inner();
        inner.forget_redirect(slug);
        if matches!(page, BuiltPage::Redirect { .. }) {
            inner.redirects.push_back(slug.to_string());
        }
        inner.entries.insert(
            slug.to_string(),
            Entry::Built {
                page,
                generated_at: Instant::now(),
                refreshing: false,
            },
        );

        while inner.redirects.len() > self.redirect_limit {
            if let Some(oldest) = inner.redirects.pop_front() {
                tracing::debug!("Evicting redirect for {:?}", oldest);
                inner.entries.remove(&oldest);
            }
        }
    }

    /// Record a failed generation
    ///
    /// A pending slug is forgotten so the next request starts over; a built
    /// page stays as it was and may be regenerated again.
    pub fn fail(&self, slug: &str) {
        let mut inner = self.inner();
        let forget = match inner.entries.get_mut(slug) {
            Some(Entry::Pending) => true,
            Some(Entry::Built { refreshing, .. }) => {
                *refreshing = false;
                false
            }
            None => false,
        };
        if forget {
            inner.entries.remove(slug);
        }
    }

    pub fn len(&self) -> usize {
        self.inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(s: &str) -> BuiltPage {
        BuiltPage::Html(Arc::from(s))
    }

    fn redirect() -> BuiltPage {
        BuiltPage::Redirect {
            location: "/",
            permanent: false,
        }
    }

    #[test]
    fn test_fresh_page_is_served() {
        let store = PageStore::new(Duration::from_secs(1800), 16);
        assert_eq!(store.lookup("a"), Lookup::Missing);
        store.insert("a", html("<p>a</p>"));
        assert_eq!(store.lookup("a"), Lookup::Serve(html("<p>a</p>")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_page_is_revalidated_once() {
        let store = PageStore::new(Duration::ZERO, 16);
        store.insert("a", html("old"));

        assert_eq!(store.lookup("a"), Lookup::Revalidate(html("old")));
        assert_eq!(store.lookup("a"), Lookup::Serve(html("old")));

        store.insert("a", html("new"));
        assert_eq!(store.lookup("a"), Lookup::Revalidate(html("new")));
    }

    #[test]
    fn test_failed_revalidation_keeps_stale_page() {
        let store = PageStore::new(Duration::ZERO, 16);
        store.insert("a", html("old"));
        assert!(matches!(store.lookup("a"), Lookup::Revalidate(_)));

        store.fail("a");
        assert_eq!(store.lookup("a"), Lookup::Revalidate(html("old")));
    }

    #[test]
    fn test_pending_slug() {
        let store = PageStore::new(Duration::from_secs(60), 16);
        assert!(store.begin("a"));
        assert!(!store.begin("a"));
        assert_eq!(store.lookup("a"), Lookup::Pending);

        let redirect = BuiltPage::Redirect {
            location: "/",
            permanent: false,
        };
        store.insert("a", redirect.clone());
        assert_eq!(store.lookup("a"), Lookup::Serve(redirect));
        assert!(!store.begin("a"));
    }

    #[test]
    fn test_failed_first_resolution_is_forgotten() {
        let store = PageStore::new(Duration::from_secs(60), 16);
        assert!(store.begin("a"));
        store.fail("a");
        assert_eq!(store.lookup("a"), Lookup::Missing);
        assert!(store.is_empty());
        assert!(store.begin("a"));
    }

    #[test]
    fn test_redirects_are_bounded() {
        let store = PageStore::new(Duration::from_secs(60), 8);
        store.insert("real", html("<p>real</p>"));

        for i in 0..1000 {
            let slug = format!("junk-{}", i);
            assert!(store.begin(&slug));
            store.insert(&slug, redirect());
        }

        assert_eq!(store.len(), 9);
        assert_eq!(store.lookup("real"), Lookup::Serve(html("<p>real</p>")));
        assert_eq!(store.lookup("junk-0"), Lookup::Missing);
        assert_eq!(store.lookup("junk-999"), Lookup::Serve(redirect()));
    }

    #[test]
    fn test_redirect_replaced_by_page_is_not_evicted() {
        let store = PageStore::new(Duration::from_secs(60), 1);
        store.insert("late", redirect());
        store.insert("late", html("<p>published</p>"));
        store.insert("other", redirect());
        store.insert("another", redirect());

        assert_eq!(store.lookup("late"), Lookup::Serve(html("<p>published</p>")));
        assert_eq!(store.lookup("other"), Lookup::Missing);
        assert_eq!(store.len(), 2);
    }
}
