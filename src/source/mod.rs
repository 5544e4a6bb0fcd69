//! Content sources - the tree of directories and documents the blog is served from
//!
//! All paths handed to a [`ContentSource`] are slash-separated and relative to
//! the source's configured root: `""` is the root itself, `"2024/post.md"` a
//! nested document. Sources clean the path with [`clean_path`] before use, so
//! `..` can never climb above the root.

mod gitea;
mod local;
mod memory;

pub use gitea::{GiteaOptions, GiteaSource};
pub use local::LocalSource;
pub use memory::MemorySource;

use std::fmt;
use std::io::Read;

use crate::render::ContentError;

/// One child of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// A directory node with its entries in whatever order the source returned them
#[derive(Debug, Clone)]
pub struct Directory {
    path: String,
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn new(path: impl Into<String>, entries: Vec<DirEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Entries as listed by the source. The order carries no meaning.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }
}

/// A document node. Its byte stream can be taken exactly once.
pub struct Document {
    path: String,
    reader: Option<Box<dyn Read + Send>>,
}

impl Document {
    pub fn new(path: impl Into<String>, reader: Box<dyn Read + Send>) -> Self {
        Self {
            path: path.into(),
            reader: Some(reader),
        }
    }

    /// Convenience constructor for sources that already hold the bytes
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(path, Box::new(std::io::Cursor::new(bytes)))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Lowercased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the stream has not been consumed yet
    pub fn is_unread(&self) -> bool {
        self.reader.is_some()
    }

    /// Consume the byte stream
    pub fn read_all(&mut self) -> Result<Vec<u8>, ContentError> {
        let mut reader = self.reader.take().ok_or(ContentError::StreamConsumed)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(ContentError::Read)?;
        Ok(bytes)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("unread", &self.reader.is_some())
            .finish()
    }
}

/// A node of the content tree
#[derive(Debug)]
pub enum Node {
    Directory(Directory),
    Document(Document),
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Directory(dir) => dir.path(),
            Node::Document(doc) => doc.path(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

/// Semantic error categories a source can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Nothing exists at the path.
    NotFound,
    /// The backend could not be reached or timed out; a retry may succeed.
    Transient,
    /// The backend answered with something that could not be understood.
    Malformed,
}

/// Error raised by a [`ContentSource`]
#[derive(Debug)]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub path: String,
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            backend: None,
            source: None,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound, path)
    }

    pub fn transient(path: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Transient, path)
    }

    pub fn malformed(path: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, path)
    }

    /// Attach backend identifier
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Map an I/O error onto a source error kind
    pub fn io(err: std::io::Error, path: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => SourceErrorKind::NotFound,
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => SourceErrorKind::Transient,
            std::io::ErrorKind::InvalidData => SourceErrorKind::Malformed,
            _ => SourceErrorKind::Transient,
        };
        Self::new(kind, path).with_source(err)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == SourceErrorKind::NotFound
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind = match self.kind {
            SourceErrorKind::NotFound => "Not found",
            SourceErrorKind::Transient => "Fetch failed",
            SourceErrorKind::Malformed => "Malformed response",
        };
        write!(f, "{kind}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        write!(f, " (path: /{})", self.path)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A tree of nodes rooted at a configured path
pub trait ContentSource: Send + Sync {
    /// Backend identifier used in diagnostics
    fn name(&self) -> &'static str;

    /// Resolve a path to a freshly produced node
    fn open(&self, path: &str) -> Result<Node, SourceError>;
}

/// Normalize a request path: drop empty and `.` segments, resolve `..`
/// without ever leaving the root, strip leading and trailing slashes.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join a root and a cleaned relative path
pub(crate) fn join_path(root: &str, path: &str) -> String {
    let root = root.trim_matches('/');
    match (root.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{}/{}", root, path),
    }
}
