//! Document renderers - markdown pages and plain text pages

use std::io::Write;
use std::sync::Arc;

use super::{Capabilities, ContentError, MediaType, RenderError, Renderer};
use crate::content::MarkdownEngine;
use crate::helpers::html;
use crate::source::{Document, Node};

/// Whether the document's extension is one of `extensions`
fn has_extension(doc: &Document, extensions: &[String]) -> bool {
    doc.extension()
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Renders markdown documents into HTML pages
pub struct MarkdownRenderer {
    engine: Arc<MarkdownEngine>,
    lang: String,
    default_title: String,
    extensions: Vec<String>,
}

impl MarkdownRenderer {
    pub const NAME: &'static str = "markdown";

    pub fn new(engine: Arc<MarkdownEngine>, lang: &str, default_title: &str) -> Self {
        Self {
            engine,
            lang: lang.to_string(),
            default_title: default_title.to_string(),
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }

    /// Replace the file extensions treated as markdown
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }
}

impl Renderer for MarkdownRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DOCUMENTS
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        let Node::Document(doc) = node else {
            return Err(RenderError::Declined);
        };
        if !has_extension(doc, &self.extensions) {
            return Err(RenderError::Declined);
        }

        let parsed = self.engine.parse(doc.read_all()?)?;
        let title = parsed.title(&self.default_title);
        let modified = parsed.metadata().modified()?;

        let mut body = String::from("<article>\n");
        if let Some(date) = parsed.metadata().date() {
            body.push_str(&format!(
                "<time datetime=\"{}\">{}</time>\n",
                date.to_rfc3339(),
                date.format("%Y-%m-%d")
            ));
        }
        if let Some(modified) = modified {
            body.push_str(&format!(
                "<time class=\"modified\" datetime=\"{}\">{}</time>\n",
                modified.to_rfc3339(),
                modified.format("%Y-%m-%d")
            ));
        }
        body.push_str(&parsed.render());
        body.push_str("</article>");

        out.write_all(html::page(&self.lang, &title, &body).as_bytes())?;
        Ok(MediaType::Html)
    }
}

/// Wraps plain text documents in an HTML page titled by the file name
pub struct TextPageRenderer {
    lang: String,
    extensions: Vec<String>,
}

impl TextPageRenderer {
    pub const NAME: &'static str = "textpage";

    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            extensions: vec!["txt".to_string()],
        }
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }
}

impl Renderer for TextPageRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DOCUMENTS
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        let Node::Document(doc) = node else {
            return Err(RenderError::Declined);
        };
        if !has_extension(doc, &self.extensions) {
            return Err(RenderError::Declined);
        }

        let text = String::from_utf8(doc.read_all()?).map_err(ContentError::from)?;
        let body = format!("<pre class=\"text\">{}</pre>", html::escape(&text));

        out.write_all(html::page(&self.lang, doc.name(), &body).as_bytes())?;
        Ok(MediaType::Html)
    }
}
