//! List a directory the way the listing renderer sees it

use anyhow::Result;

use crate::source::Node;
use crate::Blog;

/// Print the visible entries of `path` in natural order
pub fn run(blog: &Blog, path: &str, lang: Option<&str>) -> Result<()> {
    let lang = lang.unwrap_or_else(|| blog.dispatcher(None).lang());
    if !blog.has_language(lang) {
        anyhow::bail!(
            "Unknown language: {}. Available: {}",
            lang,
            blog.languages().collect::<Vec<_>>().join(", ")
        );
    }

    let entries = match blog.source_for(lang).open(path)? {
        Node::Directory(dir) => blog.listing_renderer(lang).entries(&dir),
        Node::Document(doc) => anyhow::bail!("Not a directory: /{}", doc.path()),
    };

    println!("Entries ({}):", entries.len());
    for entry in entries {
        if entry.is_dir {
            println!("  {}/", entry.name);
        } else {
            println!("  {}", entry.name);
        }
    }

    Ok(())
}
