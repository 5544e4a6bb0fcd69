//! Folding renderer - tries an ordered list of child renderers

use std::io::Write;

use super::{Capabilities, MediaType, RenderError, Renderer};
use crate::source::Node;

/// Owns an ordered sub-chain and folds it into one result.
///
/// Children are tried in registration order. A decline moves on to the next
/// child; the first success wins; any other error stops the fold and is
/// returned annotated with the child's name. When every child declines, the
/// fold itself declines.
pub struct FoldingRenderer {
    name: String,
    children: Vec<Box<dyn Renderer>>,
}

impl FoldingRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Append a child; later children have lower priority
    #[must_use]
    pub fn with<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.push(Box::new(renderer));
        self
    }

    pub fn push(&mut self, renderer: Box<dyn Renderer>) {
        tracing::debug!("{}: registered renderer {}", self.name, renderer.name());
        self.children.push(renderer);
    }

    pub fn children(&self) -> &[Box<dyn Renderer>] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Renderer for FoldingRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.children
            .iter()
            .fold(Capabilities::default(), |caps, child| {
                caps.union(child.capabilities())
            })
    }

    fn is_terminal(&self) -> bool {
        self.children.iter().any(|child| child.is_terminal())
    }

    fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name()];
        for child in &self.children {
            names.extend(child.names());
        }
        names
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        for child in &self.children {
            if !child.capabilities().accepts(node) {
                tracing::trace!("{}: {} cannot take /{}", self.name, child.name(), node.path());
                continue;
            }

            let was_unread = match node {
                Node::Document(doc) => doc.is_unread(),
                Node::Directory(_) => false,
            };

            // Children write into scratch space so a failure never leaves
            // partial output in the caller's sink.
            let mut scratch = Vec::new();
            match child.render(node, &mut scratch) {
                Ok(media_type) => {
                    tracing::debug!(
                        "{}: /{} rendered by {}",
                        self.name,
                        node.path(),
                        child.name()
                    );
                    out.write_all(&scratch)?;
                    return Ok(media_type);
                }
                Err(RenderError::Declined) => {
                    tracing::debug!("{}: {} declined /{}", self.name, child.name(), node.path());
                    if let Node::Document(doc) = node {
                        if was_unread && !doc.is_unread() {
                            tracing::warn!(
                                "{}: {} consumed /{} before declining",
                                self.name,
                                child.name(),
                                doc.path()
                            );
                        }
                    }
                }
                Err(err) => {
                    tracing::debug!("{}: {} failed on /{}: {}", self.name, child.name(), node.path(), err);
                    return Err(err.in_renderer(child.name()));
                }
            }
        }

        Err(RenderError::Declined)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::ContentError;
    use crate::source::{Directory, Document};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// What a stub renderer does when invoked
    #[derive(Clone, Copy)]
    pub(crate) enum Behaviour {
        Decline,
        Succeed,
        HardFail,
        /// Writes some bytes, then fails
        WriteThenFail,
    }

    pub(crate) struct Stub {
        pub name: &'static str,
        pub behaviour: Behaviour,
        pub calls: Arc<AtomicUsize>,
    }

    impl Stub {
        pub fn new(name: &'static str, behaviour: Behaviour) -> Self {
            Self {
                name,
                behaviour,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl Renderer for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::ALL
        }

        fn render(&self, _node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Decline => Err(RenderError::Declined),
                Behaviour::Succeed => {
                    out.write_all(self.name.as_bytes())?;
                    Ok(MediaType::PlainText)
                }
                Behaviour::HardFail => Err(ContentError::MetadataShape.into()),
                Behaviour::WriteThenFail => {
                    out.write_all(b"partial")?;
                    Err(ContentError::MetadataShape.into())
                }
            }
        }
    }

    fn doc() -> Node {
        Node::Document(Document::from_bytes("a.md", b"body".to_vec()))
    }

    #[test]
    fn test_first_success_after_declines() {
        let c = Stub::new("c", Behaviour::Succeed);
        let c_calls = c.counter();
        let fold = FoldingRenderer::new("fold")
            .with(Stub::new("a", Behaviour::Decline))
            .with(Stub::new("b", Behaviour::Decline))
            .with(c);

        let mut out = Vec::new();
        let media = fold.render(&mut doc(), &mut out).unwrap();
        assert_eq!(media, MediaType::PlainText);
        assert_eq!(out, b"c");
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hard_failure_stops_the_fold() {
        let c = Stub::new("c", Behaviour::Succeed);
        let c_calls = c.counter();
        let fold = FoldingRenderer::new("fold")
            .with(Stub::new("a", Behaviour::Decline))
            .with(Stub::new("b", Behaviour::HardFail))
            .with(c);

        let mut out = Vec::new();
        let err = fold.render(&mut doc(), &mut out).unwrap_err();
        assert_eq!(err.renderer_name(), Some("b"));
        assert!(err.is_content_error());
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_all_declines_make_the_fold_decline() {
        let fold = FoldingRenderer::new("fold")
            .with(Stub::new("a", Behaviour::Decline))
            .with(Stub::new("b", Behaviour::Decline));
        let mut out = Vec::new();
        let err = fold.render(&mut doc(), &mut out).unwrap_err();
        assert!(err.is_decline());

        let empty = FoldingRenderer::new("empty");
        assert!(empty.render(&mut doc(), &mut out).unwrap_err().is_decline());
    }

    #[test]
    fn test_failed_child_leaves_sink_untouched() {
        let fold = FoldingRenderer::new("fold").with(Stub::new("a", Behaviour::WriteThenFail));
        let mut out = b"existing".to_vec();
        assert!(fold.render(&mut doc(), &mut out).is_err());
        assert_eq!(out, b"existing");
    }

    #[test]
    fn test_nested_folds() {
        let inner = FoldingRenderer::new("inner")
            .with(Stub::new("x", Behaviour::Decline))
            .with(Stub::new("y", Behaviour::HardFail));
        let outer = FoldingRenderer::new("outer")
            .with(Stub::new("a", Behaviour::Decline))
            .with(inner)
            .with(Stub::new("z", Behaviour::Succeed));

        let err = outer.render(&mut doc(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.renderer_name(), Some("y"));
        assert_eq!(outer.names(), vec!["outer", "a", "inner", "x", "y", "z"]);
    }

    #[test]
    fn test_children_skipped_by_capability() {
        struct DirsOnly;
        impl Renderer for DirsOnly {
            fn name(&self) -> &str {
                "dirs"
            }
            fn capabilities(&self) -> Capabilities {
                Capabilities::DIRECTORIES
            }
            fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
                assert!(node.is_directory(), "must not be called for documents");
                out.write_all(b"dir")?;
                Ok(MediaType::Html)
            }
        }

        let fold = FoldingRenderer::new("fold")
            .with(DirsOnly)
            .with(Stub::new("b", Behaviour::Succeed));
        assert_eq!(fold.capabilities(), Capabilities::ALL);

        let mut out = Vec::new();
        fold.render(&mut doc(), &mut out).unwrap();
        assert_eq!(out, b"b");

        let mut dir = Node::Directory(Directory::new("", Vec::new()));
        let mut out = Vec::new();
        assert_eq!(fold.render(&mut dir, &mut out).unwrap(), MediaType::Html);
        assert_eq!(out, b"dir");
    }
}
