//! Dispatcher - resolves a path from a content source and renders it

use std::collections::HashSet;
use std::sync::Arc;

use super::{ConfigError, FoldingRenderer, MediaType, RenderError, Renderer};
use crate::source::{clean_path, ContentSource};

/// A rendered node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Cleaned content path
    pub path: String,
    pub media_type: MediaType,
    pub body: Vec<u8>,
}

/// Top-level renderer chain bound to a content source
///
/// Built through [`DispatcherBuilder`], which rejects chains that could let a
/// decline escape to the caller.
pub struct Dispatcher {
    lang: String,
    source: Arc<dyn ContentSource>,
    chain: FoldingRenderer,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("lang", &self.lang)
            .field("source", &self.source.name())
            .field("chain", &self.chain.names())
            .finish()
    }
}

impl Dispatcher {
    pub fn builder(source: Arc<dyn ContentSource>) -> DispatcherBuilder {
        DispatcherBuilder {
            lang: String::new(),
            source,
            chain: FoldingRenderer::new("dispatcher"),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.source
    }

    /// Names of every registered renderer, in priority order
    pub fn renderer_names(&self) -> Vec<&str> {
        self.chain.names().into_iter().skip(1).collect()
    }

    /// Open `path` and run it through the chain
    pub fn render_path(&self, path: &str) -> Result<Page, RenderError> {
        let path = clean_path(path);
        let mut node = self.source.open(&path).map_err(|err| {
            tracing::debug!("[{}] open /{} failed: {}", self.lang, path, err);
            RenderError::Source(err)
        })?;

        let mut body = Vec::new();
        match self.chain.render(&mut node, &mut body) {
            Ok(media_type) => {
                tracing::info!(
                    "[{}] rendered /{} ({} bytes, {})",
                    self.lang,
                    path,
                    body.len(),
                    media_type
                );
                Ok(Page {
                    path,
                    media_type,
                    body,
                })
            }
            Err(RenderError::Declined) => {
                tracing::error!("[{}] every renderer declined /{}", self.lang, path);
                Err(RenderError::Unhandled { path })
            }
            Err(err) => {
                tracing::warn!("[{}] failed to render /{}: {}", self.lang, path, err);
                Err(err)
            }
        }
    }
}

/// Collects renderers in priority order and validates the chain
pub struct DispatcherBuilder {
    lang: String,
    source: Arc<dyn ContentSource>,
    chain: FoldingRenderer,
}

impl DispatcherBuilder {
    /// Language tag used in diagnostics
    #[must_use]
    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    /// Register a renderer after the ones already registered
    #[must_use]
    pub fn with<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.chain.push(Box::new(renderer));
        self
    }

    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let Some(last) = self.chain.children().last() else {
            return Err(ConfigError::EmptyChain);
        };
        if !last.is_terminal() {
            return Err(ConfigError::MissingFallback(last.name().to_string()));
        }
        if !self.chain.capabilities().directories {
            return Err(ConfigError::NoDirectoryRenderer);
        }

        let mut seen = HashSet::new();
        for name in self.chain.names().into_iter().skip(1) {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateName(name.to_string()));
            }
        }

        tracing::debug!(
            "[{}] renderer chain: {}",
            self.lang,
            self.chain.names()[1..].join(" -> ")
        );

        Ok(Dispatcher {
            lang: self.lang,
            source: self.source,
            chain: self.chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MarkdownEngine;
    use crate::render::fold::tests::{Behaviour, Stub};
    use crate::render::{
        ListingOptions, ListingRenderer, MarkdownRenderer, PlainTextRenderer, TextPageRenderer,
    };
    use crate::source::{MemorySource, SourceErrorKind};

    fn source() -> Arc<dyn ContentSource> {
        Arc::new(
            MemorySource::new()
                .with_file(".git/config", "[core]")
                .with_file("README.md", "# Readme")
                .with_file("post10.md", "# Ten")
                .with_file("post2.md", "---\ntitle: Two\n---\n# Second")
                .with_file("post1.md", "# One\n\nBody.")
                .with_file("broken.md", "---\ntitle: [oops\n---\n")
                .with_file("notes.txt", "some notes")
                .with_file("image.png", vec![0x89u8, b'P', b'N', b'G', 0xff]),
        )
    }

    fn dispatcher() -> Dispatcher {
        let engine = Arc::new(MarkdownEngine::default());
        let documents = FoldingRenderer::new("documents")
            .with(MarkdownRenderer::new(engine, "en", "Untitled"))
            .with(TextPageRenderer::new("en"));

        Dispatcher::builder(source())
            .lang("en")
            .with(ListingRenderer::new("en", "/blog", "Blog", &ListingOptions::default()))
            .with(documents)
            .with(PlainTextRenderer::new())
            .build()
            .unwrap()
    }

    fn body(page: &Page) -> String {
        String::from_utf8(page.body.clone()).unwrap()
    }

    #[test]
    fn test_directory_renders_listing() {
        let page = dispatcher().render_path("/").unwrap();
        assert_eq!(page.media_type, MediaType::Html);
        let html = body(&page);
        assert!(!html.contains(".git"));
        assert!(!html.contains("README.md"));
        let p1 = html.find("post1.md").unwrap();
        let p2 = html.find("post2.md").unwrap();
        let p10 = html.find("post10.md").unwrap();
        assert!(p1 < p2 && p2 < p10);
    }

    #[test]
    fn test_markdown_document() {
        let page = dispatcher().render_path("post2.md").unwrap();
        assert_eq!(page.media_type, MediaType::Html);
        assert!(body(&page).contains("<title>Two</title>"));
    }

    #[test]
    fn test_text_and_binary_documents() {
        let page = dispatcher().render_path("notes.txt").unwrap();
        assert!(body(&page).contains("<pre class=\"text\">some notes</pre>"));

        let page = dispatcher().render_path("image.png").unwrap();
        assert_eq!(page.media_type, MediaType::Binary);
        assert_eq!(page.body, vec![0x89u8, b'P', b'N', b'G', 0xff]);
    }

    #[test]
    fn test_broken_markdown_does_not_fall_through() {
        let err = dispatcher().render_path("broken.md").unwrap_err();
        assert!(err.is_content_error());
        assert_eq!(err.renderer_name(), Some("markdown"));
    }

    #[test]
    fn test_missing_path_is_a_source_error() {
        let err = dispatcher().render_path("nope.md").unwrap_err();
        assert!(matches!(err, RenderError::Source(_)));
        assert_eq!(err.source_kind(), Some(SourceErrorKind::NotFound));
        assert!(!err.is_content_error());
    }

    #[test]
    fn test_rendering_twice_is_byte_identical() {
        let dispatcher = dispatcher();
        for path in ["post1.md", "", "notes.txt"] {
            let first = dispatcher.render_path(path).unwrap();
            let second = dispatcher.render_path(path).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_paths_are_cleaned() {
        let page = dispatcher().render_path("/../post1.md/").unwrap();
        assert_eq!(page.path, "post1.md");
    }

    #[test]
    fn test_raw_chain() {
        let dispatcher = Dispatcher::builder(source())
            .with(ListingRenderer::new("en", "/blog", "Blog", &ListingOptions::default()))
            .with(PlainTextRenderer::new())
            .build()
            .unwrap();
        let page = dispatcher.render_path("post1.md").unwrap();
        assert_eq!(page.media_type, MediaType::PlainText);
        assert_eq!(page.body, b"# One\n\nBody.");
    }

    #[test]
    fn test_builder_rejects_bad_chains() {
        let err = Dispatcher::builder(source()).build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyChain);

        let err = Dispatcher::builder(source())
            .with(PlainTextRenderer::new())
            .with(ListingRenderer::new("en", "/blog", "Blog", &ListingOptions::default()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingFallback("listing".to_string()));

        let err = Dispatcher::builder(source())
            .with(PlainTextRenderer::new())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoDirectoryRenderer);

        let err = Dispatcher::builder(source())
            .with(ListingRenderer::new("en", "/blog", "Blog", &ListingOptions::default()))
            .with(FoldingRenderer::new("docs").with(PlainTextRenderer::new()))
            .with(PlainTextRenderer::new())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateName("plaintext".to_string()));
    }

    #[test]
    fn test_hard_failure_skips_later_renderers() {
        let last = Stub::new("last", Behaviour::Succeed);
        let calls = last.counter();
        struct Terminal(Stub);
        impl Renderer for Terminal {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn capabilities(&self) -> crate::render::Capabilities {
                self.0.capabilities()
            }
            fn is_terminal(&self) -> bool {
                true
            }
            fn render(
                &self,
                node: &mut crate::source::Node,
                out: &mut dyn std::io::Write,
            ) -> Result<MediaType, RenderError> {
                self.0.render(node, out)
            }
        }

        let dispatcher = Dispatcher::builder(source())
            .with(Stub::new("a", Behaviour::Decline))
            .with(Stub::new("b", Behaviour::HardFail))
            .with(Terminal(last))
            .build()
            .unwrap();

        let err = dispatcher.render_path("post1.md").unwrap_err();
        assert_eq!(err.renderer_name(), Some("b"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    struct FailingSource(SourceErrorKind);

    impl ContentSource for FailingSource {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn open(&self, path: &str) -> Result<crate::source::Node, crate::source::SourceError> {
            Err(crate::source::SourceError::new(self.0, path)
                .with_backend(self.name())
                .with_source("connection refused"))
        }
    }

    #[test]
    fn test_source_failures_pass_through_unchanged() {
        for kind in [SourceErrorKind::Transient, SourceErrorKind::Malformed] {
            let first = Stub::new("first", Behaviour::Succeed);
            let calls = first.counter();
            let dispatcher = Dispatcher::builder(Arc::new(FailingSource(kind)))
                .with(first)
                .with(ListingRenderer::new("en", "/blog", "Blog", &ListingOptions::default()))
                .with(PlainTextRenderer::new())
                .build()
                .unwrap();

            let err = dispatcher.render_path("/2024/post.md").unwrap_err();
            let RenderError::Source(source_err) = &err else {
                panic!("expected a source error, got {err:?}");
            };
            assert_eq!(source_err.kind, kind);
            assert_eq!(source_err.path, "2024/post.md");
            assert_eq!(source_err.backend, Some("Failing"));
            assert_eq!(err.source_kind(), Some(kind));
            assert_eq!(err.renderer_name(), None);
            assert!(!err.is_content_error());
            assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_dispatcher_is_shareable_across_threads() {
        let dispatcher = Arc::new(dispatcher());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                std::thread::spawn(move || dispatcher.render_path("post1.md").unwrap().body)
            })
            .collect();
        let bodies: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    }
}
