//! Directory listings in natural order

use std::collections::HashSet;
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::{Capabilities, MediaType, RenderError, Renderer};
use crate::helpers::{html, natsort};
use crate::source::{Directory, Node};

/// Which entries a listing hides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingOptions {
    /// Entries whose name starts with this are hidden
    pub hidden_prefix: String,
    /// File names never listed (compared case-insensitively)
    pub exclude: Vec<String>,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            hidden_prefix: ".".to_string(),
            exclude: vec![
                "README".to_string(),
                "README.md".to_string(),
                "LICENSE".to_string(),
                "LICENSE.md".to_string(),
            ],
        }
    }
}

/// One visible entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    /// Language tag the entry links to
    pub lang: String,
}

/// Renders a directory as a naturally ordered index
#[derive(Debug, Clone)]
pub struct ListingRenderer {
    lang: String,
    base_url: String,
    site_title: String,
    hidden_prefix: String,
    exclude: HashSet<String>,
}

impl ListingRenderer {
    pub const NAME: &'static str = "listing";

    /// `base_url` is the URL prefix content paths are served under, e.g. `/blog`
    pub fn new(lang: &str, base_url: &str, site_title: &str, options: &ListingOptions) -> Self {
        Self {
            lang: lang.to_string(),
            base_url: base_url.to_string(),
            site_title: site_title.to_string(),
            hidden_prefix: options.hidden_prefix.clone(),
            exclude: options
                .exclude
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    fn is_visible(&self, name: &str) -> bool {
        if !self.hidden_prefix.is_empty() && name.starts_with(&self.hidden_prefix) {
            return false;
        }
        !self.exclude.contains(&name.to_lowercase())
    }

    /// Visible entries of `dir`, sorted in natural order
    pub fn entries(&self, dir: &Directory) -> Vec<ListingEntry> {
        let mut entries: Vec<ListingEntry> = dir
            .entries()
            .iter()
            .filter(|entry| self.is_visible(&entry.name))
            .map(|entry| ListingEntry {
                name: entry.name.clone(),
                is_dir: entry.is_dir,
                lang: self.lang.clone(),
            })
            .collect();

        entries.sort_by(|a, b| natsort::natural_cmp(&a.name, &b.name));
        entries
    }

    fn title_for(&self, dir: &Directory) -> String {
        match dir.path().rsplit('/').next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.site_title.clone(),
        }
    }

    fn render_html(&self, dir: &Directory, entries: &[ListingEntry]) -> String {
        let mut body = String::from("<ul class=\"listing\">\n");
        for entry in entries {
            let path = if dir.path().is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", dir.path(), entry.name)
            };
            let label = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            body.push_str(&format!(
                "<li class=\"{}\"><a href=\"{}\" hreflang=\"{}\" lang=\"{}\">{}</a></li>\n",
                if entry.is_dir { "dir" } else { "file" },
                html::escape(&html::href(&self.base_url, &path, entry.is_dir)),
                html::escape(&entry.lang),
                html::escape(&entry.lang),
                html::escape(&label)
            ));
        }
        body.push_str("</ul>");

        html::page(&self.lang, &self.title_for(dir), &body)
    }
}

impl Renderer for ListingRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DIRECTORIES
    }

    fn render(&self, node: &mut Node, out: &mut dyn Write) -> Result<MediaType, RenderError> {
        let Node::Directory(dir) = node else {
            return Err(RenderError::Declined);
        };

        let entries = self.entries(dir);
        tracing::debug!("Listing /{}: {} visible entries", dir.path(), entries.len());
        out.write_all(self.render_html(dir, &entries).as_bytes())?;
        Ok(MediaType::Html)
    }
}
