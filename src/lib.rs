//! blogtree: renders a tree of markdown and text files as a browsable blog
//!
//! Content is read from a [`source::ContentSource`] (a local directory or a
//! Gitea repository) and turned into pages by a chain of renderers: directory
//! listings in natural order, markdown documents, text pages, and a raw-bytes
//! fallback that always answers.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod render;
pub mod server;
pub mod source;

use anyhow::Result;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{ChainKind, SiteConfig, SourceConfig, SourceKind};
use content::MarkdownEngine;
use render::{
    Dispatcher, FoldingRenderer, ListingRenderer, MarkdownRenderer, Page, PlainTextRenderer,
    RenderError, TextPageRenderer,
};
use source::{ContentSource, GiteaOptions, GiteaSource, LocalSource};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    source: Arc<dyn ContentSource>,
    engine: Arc<MarkdownEngine>,
    dispatchers: Arc<IndexMap<String, Dispatcher>>,
}

impl Blog {
    /// Create a new blog from a site directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            SiteConfig::load(&config_path)?
        } else {
            SiteConfig::default()
        };

        let default_source = open_source(&config.source_for(&config.language), &base_dir);
        let mut sources = IndexMap::new();
        for lang in config.all_languages() {
            let source = match config.source.languages.get(&lang) {
                Some(over) if !over.is_empty() => open_source(&config.source_for(&lang), &base_dir),
                _ => Arc::clone(&default_source),
            };
            sources.insert(lang, source);
        }

        Self::with_sources(config, base_dir, sources)
    }

    /// Create a blog over an already built source, shared by every language
    pub fn with_source(
        config: SiteConfig,
        base_dir: PathBuf,
        source: Arc<dyn ContentSource>,
    ) -> Result<Self> {
        let mut sources = IndexMap::new();
        sources.insert(config.language.clone(), source);
        Self::with_sources(config, base_dir, sources)
    }

    /// Create a blog with one source per language. Languages without an
    /// entry read from the default language's source.
    pub fn with_sources(
        config: SiteConfig,
        base_dir: PathBuf,
        sources: IndexMap<String, Arc<dyn ContentSource>>,
    ) -> Result<Self> {
        config.validate()?;
        let Some(source) = sources.get(&config.language).cloned() else {
            anyhow::bail!("No content source for default language {}", config.language);
        };
        let engine = Arc::new(MarkdownEngine::new(config.markdown.engine.clone()));

        let mut dispatchers = IndexMap::new();
        for lang in config.all_languages() {
            let lang_source = sources.get(&lang).unwrap_or(&source);
            let dispatcher = build_dispatcher(&config, &lang, lang_source, &engine)?;
            tracing::debug!("[{}] content source: {}", lang, lang_source.name());
            dispatchers.insert(lang, dispatcher);
        }

        tracing::debug!(
            "Blog ready: languages={:?}",
            dispatchers.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            config,
            base_dir,
            source,
            engine,
            dispatchers: Arc::new(dispatchers),
        })
    }

    /// Source of the default language
    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.source
    }

    /// Source `lang` reads from; the default language's when unknown
    pub fn source_for(&self, lang: &str) -> &Arc<dyn ContentSource> {
        self.dispatcher(Some(lang)).source()
    }

    pub fn engine(&self) -> &Arc<MarkdownEngine> {
        &self.engine
    }

    /// Configured languages, default first
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.dispatchers.keys().map(String::as_str)
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.dispatchers.contains_key(lang)
    }

    /// Dispatcher for `lang`; the default language when `None` or unknown
    pub fn dispatcher(&self, lang: Option<&str>) -> &Dispatcher {
        let default = &self.dispatchers[0];
        match lang {
            Some(lang) => self.dispatchers.get(lang).unwrap_or_else(|| {
                tracing::debug!("Unknown language {}, using {}", lang, default.lang());
                default
            }),
            None => default,
        }
    }

    /// Listing renderer configured for `lang`
    pub fn listing_renderer(&self, lang: &str) -> ListingRenderer {
        ListingRenderer::new(
            lang,
            &self.config.base_url(lang),
            &self.config.title,
            &self.config.listing,
        )
    }

    /// Render a content path
    pub fn render(&self, lang: Option<&str>, path: &str) -> Result<Page, RenderError> {
        self.dispatcher(lang).render_path(path)
    }
}

/// Build the content source the configuration names
fn open_source(config: &SourceConfig, base_dir: &Path) -> Arc<dyn ContentSource> {
    match config.kind {
        SourceKind::Local => {
            let root = base_dir.join(&config.local_dir).join(&config.root);
            tracing::debug!("Serving content from {:?}", root);
            Arc::new(LocalSource::new(root))
        }
        SourceKind::Gitea => {
            let gitea = &config.gitea;
            let mut options = GiteaOptions::new(&gitea.endpoint, &gitea.owner, &gitea.repo);
            options.reference = gitea.reference.clone();
            options.root = config.root.clone();
            options.timeout_secs = gitea.timeout_secs;
            tracing::debug!(
                "Serving content from {}/{}/{}@{}",
                options.endpoint,
                options.owner,
                options.repo,
                options.reference.as_deref().unwrap_or("default")
            );
            Arc::new(GiteaSource::new(options))
        }
    }
}

fn build_dispatcher(
    config: &SiteConfig,
    lang: &str,
    source: &Arc<dyn ContentSource>,
    engine: &Arc<MarkdownEngine>,
) -> Result<Dispatcher> {
    let listing = ListingRenderer::new(
        lang,
        &config.base_url(lang),
        &config.title,
        &config.listing,
    );
    let builder = Dispatcher::builder(Arc::clone(source))
        .lang(lang)
        .with(listing);

    let builder = match config.chain {
        ChainKind::Folding => {
            let documents = FoldingRenderer::new("documents")
                .with(
                    MarkdownRenderer::new(Arc::clone(engine), lang, &config.default_title)
                        .with_extensions(&config.markdown.extensions),
                )
                .with(TextPageRenderer::new(lang).with_extensions(&config.markdown.text_extensions));
            builder.with(documents)
        }
        ChainKind::Raw => builder,
    };

    Ok(builder.with(PlainTextRenderer::new()).build()?)
}
