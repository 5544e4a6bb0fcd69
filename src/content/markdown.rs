//! Markdown parsing and rendering with syntax highlighting

use std::collections::HashMap;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::frontmatter::{FrontMatter, Metadata};
use crate::helpers::html::escape;
use crate::render::ContentError;

/// Markdown engine settings, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Highlight fenced code blocks with syntect
    pub highlight: bool,
    pub highlight_theme: String,
    pub line_numbers: bool,
    /// Give every heading an id derived from its text
    pub heading_ids: bool,
    /// Append a `¶` self-link to headings that have an id
    pub heading_anchors: bool,
    /// Hosts whose links are not treated as external
    pub internal_hosts: Vec<String>,
    /// `rel` attribute of external links, omitted when empty
    pub external_link_rel: String,
    /// `target` attribute of external links, omitted when empty
    pub external_link_target: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            highlight: true,
            highlight_theme: "base16-ocean.dark".to_string(),
            line_numbers: true,
            heading_ids: true,
            heading_anchors: true,
            internal_hosts: Vec::new(),
            external_link_rel: "nofollow noopener noreferrer".to_string(),
            external_link_target: "_blank".to_string(),
        }
    }
}

/// Markdown parser and renderer
///
/// Built once from [`MarkdownOptions`] and shared read-only by every
/// renderer that needs it.
pub struct MarkdownEngine {
    options: MarkdownOptions,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl MarkdownEngine {
    pub fn new(options: MarkdownOptions) -> Self {
        Self {
            options,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Split front-matter from the body. Fails on invalid UTF-8 or
    /// unparseable front-matter.
    pub fn parse(&self, bytes: Vec<u8>) -> Result<ParsedDocument<'_>, ContentError> {
        let text = String::from_utf8(bytes)?;
        let (metadata, body) = FrontMatter::parse(&text)?;
        Ok(ParsedDocument {
            engine: self,
            metadata,
            body: body.to_string(),
        })
    }

    /// Links to another host get the configured rel/target attributes
    fn is_external(&self, url: &str) -> bool {
        let rest = if let Some(rest) = url.strip_prefix("https://") {
            rest
        } else if let Some(rest) = url.strip_prefix("http://") {
            rest
        } else if let Some(rest) = url.strip_prefix("//") {
            rest
        } else {
            return false;
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host);

        !self
            .options
            .internal_hosts
            .iter()
            .any(|internal| internal.eq_ignore_ascii_case(host))
    }

    fn external_link_open(&self, dest: &str, title: &str) -> String {
        let mut tag = format!("<a href=\"{}\"", escape(dest));
        if !title.is_empty() {
            tag.push_str(&format!(" title=\"{}\"", escape(title)));
        }
        if !self.options.external_link_rel.is_empty() {
            tag.push_str(&format!(" rel=\"{}\"", escape(&self.options.external_link_rel)));
        }
        if !self.options.external_link_target.is_empty() {
            tag.push_str(&format!(
                " target=\"{}\"",
                escape(&self.options.external_link_target)
            ));
        }
        tag.push('>');
        tag
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.options.highlight_theme)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.options.line_numbers => {
                self.add_line_numbers(&highlighted, lang)
            }
            Some(highlighted) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape(lang),
                highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape(lang),
                escape(code)
            ),
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter: Vec<String> = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect();

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            escape(lang),
            gutter.join("\n"),
            lines.join("\n")
        )
    }
}

impl Default for MarkdownEngine {
    fn default() -> Self {
        Self::new(MarkdownOptions::default())
    }
}

fn parser_options() -> Options {
    // Front-matter is split off by FrontMatter::parse, so no metadata blocks
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_GFM
}

/// A document split into metadata and markdown body
pub struct ParsedDocument<'e> {
    engine: &'e MarkdownEngine,
    metadata: Metadata,
    body: String,
}

struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    events: Vec<Event<'a>>,
}

struct PendingCode {
    lang: Option<String>,
    content: String,
}

impl<'e> ParsedDocument<'e> {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Markdown source without the front-matter
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Text of the first level-1 heading in document order, wherever it
    /// sits (block quotes and list items included).
    ///
    /// The walk stops at that heading even if its text turns out empty.
    pub fn first_heading(&self) -> Option<String> {
        let mut capturing = false;
        let mut text = String::new();

        for event in Parser::new_ext(&self.body, parser_options()) {
            match event {
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                }) => capturing = true,
                Event::End(TagEnd::Heading(_)) if capturing => {
                    let text = text.trim();
                    return (!text.is_empty()).then(|| text.to_string());
                }
                Event::Text(t) | Event::Code(t) if capturing => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak if capturing => text.push(' '),
                _ => {}
            }
        }

        None
    }

    /// Resolve the title: metadata `title` string, then the first level-1
    /// heading, then `default`.
    pub fn title(&self, default: &str) -> String {
        if let Some(title) = self.metadata.title() {
            return title.to_string();
        }
        self.first_heading()
            .unwrap_or_else(|| default.to_string())
    }

    /// Render the body to HTML
    pub fn render(&self) -> String {
        let engine = self.engine;
        let options = &engine.options;

        let mut events: Vec<Event> = Vec::new();
        let mut heading: Option<PendingHeading> = None;
        let mut code: Option<PendingCode> = None;
        let mut in_external_link = false;
        let mut used_ids: HashMap<String, usize> = HashMap::new();

        for event in Parser::new_ext(&self.body, parser_options()) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) if options.highlight => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some(PendingCode {
                        lang,
                        content: String::new(),
                    });
                }
                Event::End(TagEnd::CodeBlock) if code.is_some() => {
                    if let Some(block) = code.take() {
                        let highlighted = engine.highlight_code(&block.content, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some(block) = code.as_mut() {
                        block.content.push_str(&text);
                    }
                }
                _ if code.is_some() => {}

                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) if options.heading_ids => {
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        events: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(level)) if heading.is_some() => {
                    if let Some(pending) = heading.take() {
                        let id = match pending.id {
                            Some(id) => {
                                used_ids.entry(id.to_string()).or_insert(1);
                                id
                            }
                            None => CowStr::from(unique_id(
                                &mut used_ids,
                                &plain_text(&pending.events),
                            )),
                        };
                        let anchor = options.heading_anchors.then(|| {
                            format!(r##" <a class="anchor" href="#{}">¶</a>"##, escape(&id))
                        });
                        events.push(Event::Start(Tag::Heading {
                            level: pending.level,
                            id: Some(id),
                            classes: pending.classes,
                            attrs: pending.attrs,
                        }));
                        events.extend(pending.events);
                        if let Some(anchor) = anchor {
                            events.push(Event::InlineHtml(CowStr::from(anchor)));
                        }
                        events.push(Event::End(TagEnd::Heading(level)));
                    }
                }

                Event::Start(Tag::Link {
                    dest_url, title, ..
                }) if engine.is_external(&dest_url) => {
                    in_external_link = true;
                    let open = engine.external_link_open(&dest_url, &title);
                    sink(&mut heading, &mut events).push(Event::InlineHtml(CowStr::from(open)));
                }
                Event::End(TagEnd::Link) if in_external_link => {
                    in_external_link = false;
                    sink(&mut heading, &mut events).push(Event::InlineHtml(CowStr::from("</a>")));
                }

                other => sink(&mut heading, &mut events).push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

/// Where the next event goes: the heading being collected, or the output
fn sink<'s, 'a>(
    heading: &'s mut Option<PendingHeading<'a>>,
    events: &'s mut Vec<Event<'a>>,
) -> &'s mut Vec<Event<'a>> {
    match heading {
        Some(pending) => &mut pending.events,
        None => events,
    }
}

/// Visible text of a run of inline events
fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Slug for a heading, suffixed with a counter when already taken
fn unique_id(used: &mut HashMap<String, usize>, text: &str) -> String {
    let mut base = slug::slugify(text);
    if base.is_empty() {
        base = "section".to_string();
    }

    let count = used.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}
