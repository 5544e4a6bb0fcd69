//! Gitea / Forgejo repository contents API source
//!
//! Directories and files are fetched through
//! `GET {endpoint}/api/v1/repos/{owner}/{repo}/contents/{path}`. The API
//! answers with a JSON array for a directory and a JSON object carrying
//! base64 content for a file.

use std::time::Duration;

use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use ureq::Agent;

use super::{
    clean_path, join_path, ContentSource, DirEntry, Directory, Document, Node, SourceError,
};

/// Characters left as-is in a path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

const BACKEND: &str = "Gitea";

/// Connection settings for a repository
#[derive(Debug, Clone)]
pub struct GiteaOptions {
    /// Server base URL, e.g. `https://forge.example.com`
    pub endpoint: String,
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit; the repository default when `None`
    pub reference: Option<String>,
    /// Directory inside the repository that acts as the source root
    pub root: String,
    pub timeout_secs: u64,
}

impl GiteaOptions {
    pub fn new(endpoint: &str, owner: &str, repo: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference: None,
            root: String::new(),
            timeout_secs: DEFAULT_TIMEOUT,
        }
    }
}

/// One item of a contents API response
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentsEntry>),
    Single(Box<ContentsEntry>),
}

/// Content source backed by a remote repository
pub struct GiteaSource {
    agent: Agent,
    options: GiteaOptions,
}

impl GiteaSource {
    pub fn new(options: GiteaOptions) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(options.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent, options }
    }

    /// Contents API URL for a path relative to the configured root
    fn contents_url(&self, path: &str) -> String {
        let full = join_path(&self.options.root, path);
        let encoded: Vec<String> = full
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect();

        let mut url = format!(
            "{}/api/v1/repos/{}/{}/contents",
            self.options.endpoint,
            utf8_percent_encode(&self.options.owner, SEGMENT),
            utf8_percent_encode(&self.options.repo, SEGMENT),
        );
        if !encoded.is_empty() {
            url.push('/');
            url.push_str(&encoded.join("/"));
        }
        url
    }

    fn fetch(&self, path: &str) -> Result<String, SourceError> {
        let url = self.contents_url(path);
        tracing::debug!("GET {}", url);

        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(reference) = &self.options.reference {
            request = request.query("ref", reference);
        }

        let response = request
            .call()
            .map_err(|e| SourceError::transient(path).with_backend(BACKEND).with_source(e))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| SourceError::transient(path).with_backend(BACKEND).with_source(e))?;

        match status {
            200 => Ok(body),
            404 => Err(SourceError::not_found(path).with_backend(BACKEND)),
            s if s >= 500 || s == 429 => Err(SourceError::transient(path)
                .with_backend(BACKEND)
                .with_source(format!("HTTP {}", s))),
            s => Err(SourceError::malformed(path)
                .with_backend(BACKEND)
                .with_source(format!("HTTP {}: {}", s, body))),
        }
    }
}

impl ContentSource for GiteaSource {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn open(&self, path: &str) -> Result<Node, SourceError> {
        let path = clean_path(path);
        let body = self.fetch(&path)?;
        decode_contents(&path, &body)
    }
}

/// Turn a contents API response body into a node
fn decode_contents(path: &str, body: &str) -> Result<Node, SourceError> {
    let response: ContentsResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(path).with_backend(BACKEND).with_source(e))?;

    match response {
        ContentsResponse::Listing(items) => {
            let entries = items
                .into_iter()
                .map(|item| DirEntry {
                    is_dir: item.kind == "dir",
                    name: item.name,
                })
                .collect();
            Ok(Node::Directory(Directory::new(path, entries)))
        }
        ContentsResponse::Single(item) => match item.kind.as_str() {
            "file" | "symlink" => {
                let bytes = decode_file_content(path, &item)?;
                Ok(Node::Document(Document::from_bytes(path, bytes)))
            }
            other => Err(SourceError::malformed(path)
                .with_backend(BACKEND)
                .with_source(format!("unsupported entry type `{}`", other))),
        },
    }
}

fn decode_file_content(path: &str, item: &ContentsEntry) -> Result<Vec<u8>, SourceError> {
    let content = item.content.as_deref().unwrap_or_default();
    match item.encoding.as_deref() {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| SourceError::malformed(path).with_backend(BACKEND).with_source(e))
        }
        None | Some("") => Ok(content.as_bytes().to_vec()),
        Some(other) => Err(SourceError::malformed(path)
            .with_backend(BACKEND)
            .with_source(format!("unsupported encoding `{}`", other))),
    }
}
