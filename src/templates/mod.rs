//! Built-in page templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::{date_xml, format_date, heading_anchor, post_url, truncate};

/// Default display format of publication dates
pub const DATE_FORMAT: &str = "DD MMM YYYY";

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // Rich text bodies are serialized by us and marked `safe` in the templates
        tera.autoescape_on(vec![".html"]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/post_info.html",
                include_str!("spacetraveling/partials/post_info.html"),
            ),
        ])?;

        let tz = config.tz();
        let language = config.language.clone();
        tera.register_filter(
            "date_format",
            move |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                date_format_filter(value, args, tz, &language)
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: format an RFC 3339 timestamp in the site timezone and language
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
    tz: chrono_tz::Tz,
    language: &str,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => DATE_FORMAT.to_string(),
    };

    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(format_date(
            &date.with_timezone(&tz),
            &format,
            language,
        ))),
        // Not a timestamp: leave it alone
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub logo: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            logo: config.logo.clone(),
        }
    }
}

/// Interface strings in the site language
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub home: &'static str,
    pub load_more: &'static str,
    pub loading: &'static str,
    pub minutes: &'static str,
}

impl Labels {
    pub fn for_language(language: &str) -> Self {
        if language.to_ascii_lowercase().starts_with("pt") {
            Self {
                home: "Home",
                load_more: "Carregar mais posts",
                loading: "Carregando...",
                minutes: "min",
            }
        } else {
            Self {
                home: "Home",
                load_more: "Load more posts",
                loading: "Loading...",
                minutes: "min",
            }
        }
    }
}

/// A post in the listing
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
}

impl From<&crate::content::PostSummary> for PostCard {
    fn from(post: &crate::content::PostSummary) -> Self {
        Self {
            uid: post.uid.clone(),
            url: post_url(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: post.first_publication_date.as_ref().map(date_xml),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub posts: Vec<PostCard>,
    /// Link that shows one more page, absent on the last page
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockData {
    pub heading: String,
    pub anchor: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub date: Option<String>,
    pub reading_time: usize,
    pub blocks: Vec<BlockData>,
}

impl PostPageData {
    pub fn new(post: &crate::content::PostDetail, words_per_minute: usize) -> Self {
        let blocks = post
            .content
            .iter()
            .map(|block| BlockData {
                heading: block.heading.clone(),
                anchor: heading_anchor(&block.heading),
                html: block.body.as_html(),
            })
            .collect();

        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            description: truncate(&post.lead_text(), 160, None),
            banner_url: post.banner_url.clone(),
            author: post.author.clone(),
            date: post.first_publication_date.as_ref().map(date_xml),
            reading_time: post.reading_time(words_per_minute),
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(&SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_date_filter_uses_site_timezone() {
        let args = HashMap::new();
        let value = json!("2021-03-15T01:00:00+00:00");
        // 22:00 the previous day in Sao Paulo
        let out = date_format_filter(&value, &args, chrono_tz::America::Sao_Paulo, "pt-BR").unwrap();
        assert_eq!(out, json!("14 mar 2021"));
    }

    #[test]
    fn test_date_filter_custom_format_and_passthrough() {
        let mut args = HashMap::new();
        args.insert("format".to_string(), json!("YYYY-MM-DD"));
        let out = date_format_filter(&json!("2021-03-15T12:00:00Z"), &args, chrono_tz::UTC, "en").unwrap();
        assert_eq!(out, json!("2021-03-15"));

        let out = date_format_filter(&json!("soon"), &HashMap::new(), chrono_tz::UTC, "en").unwrap();
        assert_eq!(out, json!("soon"));
    }

    #[test]
    fn test_render_loading_page() {
        let config = SiteConfig::default();
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&config));
        context.insert("labels", &Labels::for_language(&config.language));
        context.insert("page_title", "Carregando");
        context.insert("refresh_secs", &1);
        let html = renderer().render("loading.html", &context).unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains(r#"http-equiv="refresh""#));
        assert!(html.contains(r#"<img src="/logo.svg" alt="logo">"#));
    }

    #[test]
    fn test_titles_are_escaped() {
        let config = SiteConfig::default();
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&config));
        context.insert("labels", &Labels::for_language("en"));
        context.insert(
            "listing",
            &ListingData {
                posts: vec![PostCard {
                    uid: "x".to_string(),
                    url: "/post/x".to_string(),
                    title: "<script>alert(1)</script>".to_string(),
                    subtitle: String::new(),
                    author: "Ana".to_string(),
                    date: None,
                }],
                next_link: None,
            },
        );
        let html = renderer().render("index.html", &context).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("Load more posts"));
    }
}
