//! Blog server with incremental regeneration
//!
//! Post pages are rendered once and then served from memory. A page older than
//! the revalidation interval is still served while a single background task
//! renders it again. Slugs that were not rendered at startup are resolved on
//! their first request, according to the configured fallback mode.

mod pages;

pub use pages::{BuiltPage, Lookup, PageStore};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::cms::ContentSource;
use crate::config::FallbackMode;
use crate::content::Resolution;
use crate::generator::Generator;
use crate::Blog;

/// Server state
pub struct AppState {
    generator: Generator,
    pages: PageStore,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(generator: Generator, static_dir: PathBuf) -> Self {
        let post = &generator.config().post;
        let pages = PageStore::new(
            Duration::from_secs(post.revalidate_secs),
            post.redirect_cache_size,
        );
        Self {
            generator,
            pages,
            static_dir,
        }
    }

    pub fn pages(&self) -> &PageStore {
        &self.pages
    }

    fn fallback(&self) -> FallbackMode {
        self.generator.config().post.fallback
    }

    fn max_pages(&self) -> usize {
        self.generator.config().listing.max_pages
    }
}

/// Build the router serving the blog
pub fn router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/page/:pages", get(listing_handler))
        .route("/page/:pages/", get(listing_handler))
        .route("/post/:slug", get(post_handler))
        .route("/health", get(health_handler))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(
    blog: &Blog,
    source: Arc<dyn ContentSource>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let generator = Generator::new(blog, source)?;
    let state = Arc::new(AppState::new(generator, blog.static_dir.clone()));

    let rendered = prerender(&state).await?;
    tracing::info!("Prerendered {} post pages", rendered);

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Render the pages of the known slugs before accepting requests
///
/// A slug that fails to render is left to the fallback.
pub async fn prerender(state: &AppState) -> Result<usize> {
    let mut rendered = 0;
    for slug in state.generator.known_slugs().await? {
        match build_page(state, &slug).await {
            Ok(page) => {
                state.pages.insert(&slug, page);
                rendered += 1;
            }
            Err(e) => tracing::warn!("Failed to prerender {:?}: {:#}", slug, e),
        }
    }
    Ok(rendered)
}

async fn build_page(state: &AppState, slug: &str) -> Result<BuiltPage> {
    let page = match state.generator.resolve(slug).await? {
        Resolution::Found(post) => BuiltPage::Html(state.generator.render_post(&post)?.into()),
        Resolution::Redirect {
            location,
            permanent,
        } => BuiltPage::Redirect {
            location,
            permanent,
        },
    };
    Ok(page)
}

/// Render `slug` in the background and store the result
fn spawn_build(state: Arc<AppState>, slug: String) {
    tokio::spawn(async move {
        match build_page(&state, &slug).await {
            Ok(page) => {
                tracing::debug!("Regenerated post page {:?}", slug);
                state.pages.insert(&slug, page);
            }
            Err(e) => {
                tracing::error!("Failed to generate post page {:?}: {:#}", slug, e);
                state.pages.fail(&slug);
            }
        }
    });
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    render_listing(&state, 1).await
}

async fn listing_handler(
    State(state): State<Arc<AppState>>,
    Path(pages): Path<usize>,
) -> Response {
    render_listing(&state, pages).await
}

async fn render_listing(state: &AppState, pages: usize) -> Response {
    let pages = pages.clamp(1, state.max_pages());

    let rendered = match state.generator.fetch_listing(pages).await {
        Ok(listing) => state.generator.render_listing(&listing, pages),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render listing ({} pages): {:#}", pages, e);
            (StatusCode::BAD_GATEWAY, "Failed to load posts").into_response()
        }
    }
}

async fn post_handler(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    match state.pages.lookup(&slug) {
        Lookup::Serve(page) => page_response(page),
        Lookup::Revalidate(page) => {
            spawn_build(state.clone(), slug);
            page_response(page)
        }
        Lookup::Pending => loading_response(&state),
        Lookup::Missing => match state.fallback() {
            FallbackMode::Disabled => (StatusCode::NOT_FOUND, "Not found").into_response(),
            FallbackMode::Blocking => match build_page(&state, &slug).await {
                Ok(page) => {
                    state.pages.insert(&slug, page.clone());
                    page_response(page)
                }
                Err(e) => {
                    tracing::error!("Failed to generate post page {:?}: {:#}", slug, e);
                    (StatusCode::BAD_GATEWAY, "Failed to load post").into_response()
                }
            },
            FallbackMode::Loading => {
                if state.pages.begin(&slug) {
                    tracing::debug!("Resolving unknown slug {:?}", slug);
                    spawn_build(state.clone(), slug);
                }
                loading_response(&state)
            }
        },
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

fn page_response(page: BuiltPage) -> Response {
    match page {
        BuiltPage::Html(html) => Html(html.to_string()).into_response(),
        BuiltPage::Redirect {
            location,
            permanent: true,
        } => Redirect::permanent(location).into_response(),
        BuiltPage::Redirect { location, .. } => Redirect::temporary(location).into_response(),
    }
}

/// The transitional page shown while a post is resolved
fn loading_response(state: &AppState) -> Response {
    match state.generator.render_loading() {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render loading page: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
