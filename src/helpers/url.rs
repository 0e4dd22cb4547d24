//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Path of a post page
///
/// # Examples
/// ```ignore
/// post_url("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_url(uid: &str) -> String {
    format!("/post/{}", utf8_percent_encode(uid, SEGMENT))
}

/// Path of the listing showing the first `pages` pages
pub fn listing_url(pages: usize) -> String {
    if pages <= 1 {
        "/".to_string()
    } else {
        format!("/page/{}/", pages)
    }
}

/// Whether a slug can be used as a directory name in the output
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
        && !slug.chars().any(char::is_control)
}

/// Anchor id for a content heading
pub fn heading_anchor(heading: &str) -> String {
    slug::slugify(heading)
}
