//! Plain output fallback

use std::io::Write;

use super::{Capabilities, MediaType, RenderError, Renderer};
use crate::source::Node;

/// Emits any document's bytes unchanged. Registered last in every chain.
#[derive(Debug, Default, Clone)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    pub const NAME: &'static str = "plaintext";

    pub fn new() -> Self {
        Self
    }
}

impl Renderer for PlainTextRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DOCUMENTS
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        let Node::Document(doc) = node else {
            return Err(RenderError::Declined);
        };

        let bytes = doc.read_all()?;
        out.write_all(&bytes)?;

        if std::str::from_utf8(&bytes).is_ok() {
            Ok(MediaType::PlainText)
        } else {
            Ok(MediaType::Binary)
        }
    }
}
