//! Render one content path to stdout

use anyhow::{Context, Result};
use std::io::Write;

use crate::Blog;

pub fn run(blog: &Blog, path: &str, lang: Option<&str>) -> Result<()> {
    let page = blog
        .render(lang, path)
        .with_context(|| format!("Failed to render /{}", path.trim_start_matches('/')))?;

    tracing::debug!("Content-Type: {}", page.media_type);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&page.body)?;
    stdout.flush()?;
    Ok(())
}
