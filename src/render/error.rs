//! Render errors
//!
//! [`RenderError::Declined`] is the one outcome a folding renderer retries;
//! everything else aborts the fold and reaches the caller.

use std::io;

use crate::source::{SourceError, SourceErrorKind};

/// A document could not be turned into output
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read document stream: {0}")]
    Read(#[source] io::Error),

    #[error("document stream was already consumed")]
    StreamConsumed,

    #[error("document is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid YAML front-matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("invalid JSON front-matter: {0}")]
    JsonFrontMatter(#[from] serde_json::Error),

    #[error("front-matter must be a mapping with string keys")]
    MetadataShape,

    #[error("invalid `{key}` timestamp {value:?}: {source}")]
    Timestamp {
        key: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The renderer does not apply to this node shape.
    #[error("renderer does not support this node shape")]
    Declined,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Writing to the output sink failed.
    #[error("failed to write rendered output: {0}")]
    Io(#[from] io::Error),

    /// A failure raised inside a named renderer of a chain.
    #[error("{renderer}: {source}")]
    Renderer {
        renderer: String,
        #[source]
        source: Box<RenderError>,
    },

    /// Every renderer declined; only reachable with an unvalidated chain.
    #[error("no renderer accepted /{path}")]
    Unhandled { path: String },
}

impl RenderError {
    pub fn is_decline(&self) -> bool {
        matches!(self, RenderError::Declined)
    }

    /// Annotate with the failing renderer's name. Declines and errors that
    /// already carry a name pass through unchanged.
    pub fn in_renderer(self, name: &str) -> Self {
        match self {
            RenderError::Declined | RenderError::Renderer { .. } => self,
            other => RenderError::Renderer {
                renderer: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the renderer that failed, if known
    pub fn renderer_name(&self) -> Option<&str> {
        match self {
            RenderError::Renderer { renderer, .. } => Some(renderer.as_str()),
            _ => None,
        }
    }

    /// The error beneath any renderer annotation
    pub fn root_cause(&self) -> &RenderError {
        match self {
            RenderError::Renderer { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Source error kind, when the failure came from the content source
    pub fn source_kind(&self) -> Option<SourceErrorKind> {
        match self.root_cause() {
            RenderError::Source(err) => Some(err.kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.source_kind() == Some(SourceErrorKind::NotFound)
    }

    /// True for malformed or unreadable document content
    pub fn is_content_error(&self) -> bool {
        matches!(self.root_cause(), RenderError::Content(_))
    }
}

/// A renderer chain that cannot work, rejected at construction
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("renderer chain is empty")]
    EmptyChain,

    #[error("last renderer `{0}` may decline documents; register a terminal fallback last")]
    MissingFallback(String),

    #[error("renderer name `{0}` is registered twice")]
    DuplicateName(String),

    #[error("no renderer in the chain accepts directories")]
    NoDirectoryRenderer,
}
