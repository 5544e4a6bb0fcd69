//! Content module - front-matter, metadata and markdown processing

mod frontmatter;
mod markdown;

pub use frontmatter::{FrontMatter, Metadata};
pub use markdown::{MarkdownEngine, MarkdownOptions, ParsedDocument};
