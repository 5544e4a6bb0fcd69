//! Local directory content source

use std::fs;
use std::path::{Path, PathBuf};

use super::{clean_path, ContentSource, DirEntry, Directory, Document, Node, SourceError};

/// Serves a directory on disk
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for LocalSource {
    fn name(&self) -> &'static str {
        "Local"
    }

    fn open(&self, path: &str) -> Result<Node, SourceError> {
        let path = clean_path(path);
        let full = if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&path)
        };

        let metadata = fs::metadata(&full)
            .map_err(|e| SourceError::io(e, path.as_str()).with_backend(self.name()))?;

        if metadata.is_dir() {
            let mut entries = Vec::new();
            let read_dir = fs::read_dir(&full)
                .map_err(|e| SourceError::io(e, path.as_str()).with_backend(self.name()))?;
            for entry in read_dir {
                let entry =
                    entry.map_err(|e| SourceError::io(e, path.as_str()).with_backend(self.name()))?;
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    tracing::debug!("Skipping non UTF-8 file name in {:?}", full);
                    continue;
                };
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                entries.push(DirEntry { name, is_dir });
            }
            return Ok(Node::Directory(Directory::new(path, entries)));
        }

        let file = fs::File::open(&full)
            .map_err(|e| SourceError::io(e, path.as_str()).with_backend(self.name()))?;
        Ok(Node::Document(Document::new(path, Box::new(file))))
    }
}
