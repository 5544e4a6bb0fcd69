//! HTML helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside one URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/');

/// Simple HTML escaping
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-encode each segment of a slash-separated path
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build an absolute link below `base` for a content path
///
/// # Examples
/// ```ignore
/// href("/blog", "posts/a b.md", false) // -> /blog/posts/a%20b.md
/// href("/blog", "posts", true)         // -> /blog/posts/
/// ```
pub fn href(base: &str, path: &str, is_dir: bool) -> String {
    let base = base.trim_end_matches('/');
    let mut url = if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, encode_path(path))
    };
    if is_dir || url.is_empty() {
        url.push('/');
    }
    url
}

/// Wrap a rendered body into a minimal HTML document
pub fn page(lang: &str, title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(lang),
        escape(title),
        body
    )
}
