//! Structured rich text as delivered by the CMS
//!
//! A rich text field is a list of nodes (paragraphs, headings, list items,
//! images...). Inline formatting is described by spans whose offsets count
//! UTF-16 code units into the node text.

use serde::Deserialize;

use crate::helpers::html_escape;

/// A rich text field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextNode>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub oembed: Option<Oembed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

impl RichText {
    /// Plain text of every node, joined with a space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|node| node.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize to HTML
    pub fn as_html(&self) -> String {
        let mut out = String::new();
        let mut open_list: Option<NodeKind> = None;

        for node in &self.0 {
            let list = match node.kind {
                NodeKind::ListItem | NodeKind::OListItem => Some(node.kind),
                _ => None,
            };
            if open_list != list {
                if let Some(kind) = open_list {
                    out.push_str(list_tag(kind).1);
                }
                if let Some(kind) = list {
                    out.push_str(list_tag(kind).0);
                }
                open_list = list;
            }
            render_node(node, &mut out);
        }
        if let Some(kind) = open_list {
            out.push_str(list_tag(kind).1);
        }

        out
    }
}

fn list_tag(kind: NodeKind) -> (&'static str, &'static str) {
    if kind == NodeKind::OListItem {
        ("<ol>", "</ol>")
    } else {
        ("<ul>", "</ul>")
    }
}

fn render_node(node: &RichTextNode, out: &mut String) {
    let tag = match node.kind {
        NodeKind::Heading1 => "h1",
        NodeKind::Heading2 => "h2",
        NodeKind::Heading3 => "h3",
        NodeKind::Heading4 => "h4",
        NodeKind::Heading5 => "h5",
        NodeKind::Heading6 => "h6",
        NodeKind::Preformatted => "pre",
        NodeKind::ListItem | NodeKind::OListItem => "li",
        NodeKind::Image => {
            if let Some(url) = &node.url {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                    html_escape(url),
                    html_escape(node.alt.as_deref().unwrap_or(""))
                ));
            }
            return;
        }
        NodeKind::Embed => {
            if let Some(oembed) = &node.oembed {
                out.push_str(&format!(
                    r#"<div data-oembed="{}">{}</div>"#,
                    html_escape(oembed.embed_url.as_deref().unwrap_or("")),
                    oembed.html.as_deref().unwrap_or("")
                ));
            }
            return;
        }
        NodeKind::Paragraph | NodeKind::Other => "p",
    };

    let text = node.text.as_deref().unwrap_or("");
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&apply_spans(text, &node.spans));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn open_tag(span: &Span) -> String {
    let data = span.data.clone().unwrap_or_default();
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => match data.url {
            Some(url) => {
                let target = if data.target.is_some() {
                    r#" target="_blank" rel="noopener noreferrer""#
                } else {
                    ""
                };
                format!(r#"<a href="{}"{}>"#, html_escape(&url), target)
            }
            None => "<span>".to_string(),
        },
        SpanKind::Label => match data.label {
            Some(label) => format!(r#"<span class="{}">"#, html_escape(&label)),
            None => "<span>".to_string(),
        },
        SpanKind::Other => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink if span.data.as_ref().is_some_and(|d| d.url.is_some()) => "</a>",
        _ => "</span>",
    }
}

/// Close every open span that ends at or before `offset`, reopening the
/// ones that were closed only to keep the tags nested
fn close_ended(out: &mut String, stack: &mut Vec<&Span>, offset: usize) {
    if !has_ended(stack, offset) {
        return;
    }

    let mut reopen = Vec::new();
    while let Some(span) = stack.pop() {
        out.push_str(close_tag(span));
        if span.end > offset {
            reopen.push(span);
        }
        if !has_ended(stack, offset) {
            break;
        }
    }
    for span in reopen.into_iter().rev() {
        out.push_str(&open_tag(span));
        stack.push(span);
    }
}

fn has_ended(stack: &[&Span], offset: usize) -> bool {
    stack.iter().any(|s| s.end <= offset)
}

fn apply_spans(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut offset = 0;

    for ch in text.chars() {
        close_ended(&mut out, &mut stack, offset);
        while next < spans.len() && spans[next].start <= offset {
            out.push_str(&open_tag(spans[next]));
            stack.push(spans[next]);
            next += 1;
        }

        match ch {
            '\n' => out.push_str("<br />"),
            _ => {
                let mut buf = [0u8; 4];
                out.push_str(&html_escape(ch.encode_utf8(&mut buf)));
            }
        }
        offset += ch.len_utf16();
    }

    while let Some(span) = stack.pop() {
        out.push_str(close_tag(span));
    }
    out
}
