//! Renderers - turn one content node into output bytes, or decline
//!
//! A [`Renderer`] either writes a complete output to the sink and returns the
//! media type, or writes nothing and returns an error. Returning
//! [`RenderError::Declined`] means "not applicable to this node"; a
//! [`FoldingRenderer`] moves on to its next child in that case and stops on
//! any other error.

mod dispatch;
mod document;
mod error;
mod fold;
mod listing;
mod plain;

pub use dispatch::{Dispatcher, DispatcherBuilder, Page};
pub use document::{MarkdownRenderer, TextPageRenderer};
pub use error::{ConfigError, ContentError, RenderError};
pub use fold::FoldingRenderer;
pub use listing::{ListingEntry, ListingOptions, ListingRenderer};
pub use plain::PlainTextRenderer;

use std::fmt;
use std::io::Write;

use crate::source::Node;

/// Node shapes a renderer is able to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub directories: bool,
    pub documents: bool,
}

impl Capabilities {
    pub const DIRECTORIES: Self = Self {
        directories: true,
        documents: false,
    };
    pub const DOCUMENTS: Self = Self {
        directories: false,
        documents: true,
    };
    pub const ALL: Self = Self {
        directories: true,
        documents: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            directories: self.directories || other.directories,
            documents: self.documents || other.documents,
        }
    }

    /// Whether the node's shape is covered at all
    pub fn accepts(&self, node: &Node) -> bool {
        match node {
            Node::Directory(_) => self.directories,
            Node::Document(_) => self.documents,
        }
    }
}

/// Media type of a rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Html,
    PlainText,
    Binary,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Html => "text/html; charset=utf-8",
            MediaType::PlainText => "text/plain; charset=utf-8",
            MediaType::Binary => "application/octet-stream",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named unit that renders one node
///
/// Renderers are built once and shared between concurrent requests, so they
/// hold read-only configuration only.
pub trait Renderer: Send + Sync {
    /// Unique name, used in diagnostics
    fn name(&self) -> &str;

    /// Node shapes this renderer may accept
    fn capabilities(&self) -> Capabilities;

    /// True when the renderer never declines a document
    fn is_terminal(&self) -> bool {
        false
    }

    /// Names of this renderer and of any renderers it owns
    fn names(&self) -> Vec<&str> {
        vec![self.name()]
    }

    /// Render `node` into `out`, or decline
    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn is_terminal(&self) -> bool {
        (**self).is_terminal()
    }

    fn names(&self) -> Vec<&str> {
        (**self).names()
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        (**self).render(node, out)
    }
}
