//! Resolve the title of a markdown document

use anyhow::Result;

use crate::source::Node;
use crate::Blog;

/// Title a markdown document resolves to
pub fn resolve(blog: &Blog, path: &str) -> Result<String> {
    let mut doc = match blog.source().open(path)? {
        Node::Document(doc) => doc,
        Node::Directory(dir) => anyhow::bail!("Not a document: /{}", dir.path()),
    };

    let parsed = blog.engine().parse(doc.read_all()?)?;
    Ok(parsed.title(&blog.config.default_title))
}

pub fn run(blog: &Blog, path: &str) -> Result<()> {
    println!("{}", resolve(blog, path)?);
    Ok(())
}
