//! Estimated reading time of a post

use lazy_static::lazy_static;
use regex::Regex;

use super::{ContentBlock, RichText};

/// Words read per minute unless the site config says otherwise
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"</?[A-Za-z][^<>]*>").unwrap();
}

/// Number of words in a rich text body, ignoring any HTML tags in the text
pub fn count_words(body: &RichText) -> usize {
    let text = body.as_text();
    MARKUP.replace_all(&text, " ").split_whitespace().count()
}

/// Minutes needed to read every block; each block is rounded up on its own
pub fn reading_time(blocks: &[ContentBlock], words_per_minute: usize) -> usize {
    let words_per_minute = words_per_minute.max(1);
    blocks
        .iter()
        .map(|block| count_words(&block.body).div_ceil(words_per_minute))
        .sum()
}
