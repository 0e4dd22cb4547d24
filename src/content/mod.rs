//! Content module - post models, rich text and post resolution

mod post;
pub mod reading_time;
mod resolver;
mod richtext;

pub use post::{ContentBlock, PostDetail, PostSummary};
pub use reading_time::{count_words, reading_time, DEFAULT_WORDS_PER_MINUTE};
pub use resolver::{resolve_post, Resolution};
pub use richtext::{NodeKind, RichText, RichTextNode, Span, SpanKind};
