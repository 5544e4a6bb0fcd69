//! In-memory content source
//!
//! Holds a tree of documents in a map keyed by path. Directories are implied
//! by the documents below them and can also be declared empty with
//! [`MemorySource::with_dir`]. Entry order follows insertion order.

use indexmap::{IndexMap, IndexSet};

use super::{clean_path, ContentSource, DirEntry, Directory, Document, Node, SourceError};

/// In-memory tree, for tests and for embedding fixed content
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: IndexMap<String, Vec<u8>>,
    dirs: IndexSet<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; parent directories are created implicitly
    #[must_use]
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let path = clean_path(path);
        self.add_parents(&path);
        self.files.insert(path, content.into());
        self
    }

    /// Add an (possibly empty) directory
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        let path = clean_path(path);
        self.add_parents(&path);
        if !path.is_empty() {
            self.dirs.insert(path);
        }
        self
    }

    fn add_parents(&mut self, path: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            self.dirs.insert(current.clone());
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }

    /// Direct children of `dir`, in insertion order, without duplicates
    fn children(&self, dir: &str) -> Vec<DirEntry> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        let direct_child = |path: &str| -> Option<String> {
            let rest = path.strip_prefix(prefix.as_str())?;
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        };

        let mut entries = Vec::new();
        for name in self.dirs.iter().filter_map(|d| direct_child(d)) {
            entries.push(DirEntry::dir(name));
        }
        for name in self.files.keys().filter_map(|f| direct_child(f)) {
            entries.push(DirEntry::file(name));
        }
        entries
    }
}

impl ContentSource for MemorySource {
    fn name(&self) -> &'static str {
        "Memory"
    }

    fn open(&self, path: &str) -> Result<Node, SourceError> {
        let path = clean_path(path);

        if let Some(bytes) = self.files.get(&path) {
            return Ok(Node::Document(Document::from_bytes(path, bytes.clone())));
        }

        if self.is_dir(&path) {
            let entries = self.children(&path);
            return Ok(Node::Directory(Directory::new(path, entries)));
        }

        Err(SourceError::not_found(path).with_backend(self.name()))
    }
}
