//! Helper functions for templates and pages
//!
//! Date formatting, HTML escaping and URL building shared by the rich text
//! serializer, the template filters and the generator.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
