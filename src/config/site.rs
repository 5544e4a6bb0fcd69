//! Site configuration (_config.yml)

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::MarkdownOptions;
use crate::render::ListingOptions;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    /// Title of documents that name none themselves
    pub default_title: String,
    /// Default language, served without a language prefix
    pub language: String,
    /// Additional languages, served under `/{lang}`
    pub languages: Vec<String>,

    // URL
    /// Prefix content paths are served under
    pub base_path: String,

    // Rendering
    pub chain: ChainKind,
    pub source: SourceConfig,
    pub listing: ListingOptions,
    pub markdown: MarkdownConfig,

    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            default_title: "Blog".to_string(),
            language: "en".to_string(),
            languages: Vec::new(),

            base_path: "/blog".to_string(),

            chain: ChainKind::default(),
            source: SourceConfig::default(),
            listing: ListingOptions::default(),
            markdown: MarkdownConfig::default(),

            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working site
    pub fn validate(&self) -> Result<()> {
        if self.language.is_empty() {
            anyhow::bail!("language must not be empty");
        }
        if !self.base_path.starts_with('/') || self.base_path.trim_end_matches('/').is_empty() {
            anyhow::bail!("base_path must be a path below '/': {}", self.base_path);
        }
        let langs = self.all_languages();
        for lang in self.source.languages.keys() {
            if !langs.contains(lang) {
                anyhow::bail!("source.languages.{} is not a configured language", lang);
            }
        }
        if self.source.kind == SourceKind::Gitea {
            let gitea = &self.source.gitea;
            if gitea.endpoint.is_empty() || gitea.owner.is_empty() || gitea.repo.is_empty() {
                anyhow::bail!("source.gitea needs endpoint, owner and repo");
            }
        }
        Ok(())
    }

    /// Default language first, then the extra ones without duplicates
    pub fn all_languages(&self) -> Vec<String> {
        let mut langs = vec![self.language.clone()];
        for lang in &self.languages {
            if !langs.contains(lang) {
                langs.push(lang.clone());
            }
        }
        langs
    }

    /// Source settings for `lang`, with its override applied
    pub fn source_for(&self, lang: &str) -> SourceConfig {
        let mut source = self.source.clone();
        source.languages.clear();
        if let Some(over) = self.source.languages.get(lang) {
            if let Some(root) = &over.root {
                source.root = root.clone();
            }
            if let Some(local_dir) = &over.local_dir {
                source.local_dir = local_dir.clone();
            }
            if over.reference.is_some() {
                source.gitea.reference = over.reference.clone();
            }
        }
        source
    }

    /// URL prefix for content in `lang`
    pub fn base_url(&self, lang: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        if lang == self.language {
            base.to_string()
        } else {
            format!("/{}{}", lang, base)
        }
    }
}

/// Shape of the renderer chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// Listing, then markdown/text pages, then raw bytes
    #[default]
    Folding,
    /// Listing, then raw bytes
    Raw,
}

/// Where content comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Local,
    Gitea,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory inside the source that acts as the content root
    pub root: String,
    /// Local content directory, relative to the site directory
    pub local_dir: String,
    pub gitea: GiteaConfig,
    /// Per-language overrides, e.g. a translated blog on another branch
    pub languages: IndexMap<String, SourceOverride>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Local,
            root: String::new(),
            local_dir: "content".to_string(),
            gitea: GiteaConfig::default(),
            languages: IndexMap::new(),
        }
    }
}

/// Source settings that differ for one language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOverride {
    pub root: Option<String>,
    pub local_dir: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl SourceOverride {
    /// Whether the override changes nothing
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.local_dir.is_none() && self.reference.is_none()
    }
}

/// Remote repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GiteaConfig {
    pub endpoint: String,
    pub owner: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GiteaConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            owner: String::new(),
            repo: String::new(),
            reference: None,
            timeout_secs: 30,
        }
    }
}

/// Document renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Extensions rendered as markdown
    pub extensions: Vec<String>,
    /// Extensions wrapped in a text page
    pub text_extensions: Vec<String>,
    #[serde(flatten)]
    pub engine: MarkdownOptions,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            text_extensions: vec!["txt".to_string()],
            engine: MarkdownOptions::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Blog");
        assert_eq!(config.default_title, "Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.chain, ChainKind::Folding);
        assert_eq!(config.source.kind, SourceKind::Local);
        assert_eq!(config.server.port, 4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: de
languages: [en, de, fr]
chain: raw
source:
  kind: gitea
  root: posts
  gitea:
    endpoint: https://git.example.com
    owner: me
    repo: blog
    ref: main
listing:
  exclude: [TODO.md]
markdown:
  extensions: [md]
  line_numbers: false
  internal_hosts: [example.com]
server:
  port: 8080
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.chain, ChainKind::Raw);
        assert_eq!(config.source.kind, SourceKind::Gitea);
        assert_eq!(config.source.root, "posts");
        assert_eq!(config.source.gitea.reference.as_deref(), Some("main"));
        assert_eq!(config.source.gitea.timeout_secs, 30);
        assert_eq!(config.listing.exclude, vec!["TODO.md"]);
        assert_eq!(config.listing.hidden_prefix, ".");
        assert_eq!(config.markdown.extensions, vec!["md"]);
        assert!(!config.markdown.engine.line_numbers);
        assert!(config.markdown.engine.highlight);
        assert_eq!(config.markdown.engine.internal_hosts, vec!["example.com"]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.ip, "localhost");
        assert_eq!(config.all_languages(), vec!["de", "en", "fr"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_source_per_language() {
        let yaml = r#"
language: en-US
languages: [pt-BR]
source:
  kind: gitea
  root: blog
  gitea:
    endpoint: https://forge.example.com
    owner: me
    repo: site-blog
    ref: main
  languages:
    pt-BR:
      ref: main-pt
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        let en = config.source_for("en-US");
        assert_eq!(en.gitea.reference.as_deref(), Some("main"));
        assert_eq!(en.root, "blog");

        let pt = config.source_for("pt-BR");
        assert_eq!(pt.gitea.reference.as_deref(), Some("main-pt"));
        assert_eq!(pt.root, "blog");
        assert_eq!(pt.gitea.repo, "site-blog");
        assert!(pt.languages.is_empty());
    }

    #[test]
    fn test_validate_rejects_override_for_unknown_language() {
        let mut config = SiteConfig::default();
        config.source.languages.insert(
            "fr".to_string(),
            SourceOverride {
                local_dir: Some("content-fr".to_string()),
                ..SourceOverride::default()
            },
        );
        assert!(config.validate().is_err());

        config.languages.push("fr".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.source_for("fr").local_dir, "content-fr");
        assert_eq!(config.source_for("en").local_dir, "content");
    }

    #[test]
    fn test_base_url_per_language() {
        let config = SiteConfig {
            languages: vec!["fr".to_string()],
            ..SiteConfig::default()
        };
        assert_eq!(config.base_url("en"), "/blog");
        assert_eq!(config.base_url("fr"), "/fr/blog");
    }

    #[test]
    fn test_validate_rejects_incomplete_gitea() {
        let mut config = SiteConfig::default();
        config.source.kind = SourceKind::Gitea;
        config.source.gitea.endpoint = "https://git.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.base_path = "blog".to_string();
        assert!(config.validate().is_err());
        config.base_path = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: Notes\ndefault_title: No title\n").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "Notes");
        assert_eq!(config.default_title, "No title");

        fs::write(&path, "chain: sideways\n").unwrap();
        assert!(SiteConfig::load(&path).is_err());
    }
}
