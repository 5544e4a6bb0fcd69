//! HTTP server - serves rendered content paths

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::render::RenderError;
use crate::source::SourceErrorKind;
use crate::Blog;

/// Build the router for `blog`
///
/// The default language is served under `base_path`, every configured
/// language under `/{lang}{base_path}`.
pub fn router(blog: Blog) -> Router {
    let base = blog.config.base_path.trim_end_matches('/').to_string();
    let state = Arc::new(blog);

    Router::new()
        .route(&base, get(default_root))
        .route(&format!("{}/", base), get(default_root))
        .route(&format!("{}/*path", base), get(default_path))
        .route(&format!("/:lang{}", base), get(lang_root))
        .route(&format!("/:lang{}/", base), get(lang_root))
        .route(&format!("/:lang{}/*path", base), get(lang_path))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: Blog, ip: &str, port: u16) -> Result<()> {
    let base = blog.config.base_path.clone();
    let app = router(blog);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}{}/", ip, port, base.trim_end_matches('/'));
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn default_root(State(blog): State<Arc<Blog>>) -> Response {
    serve(blog, None, String::new()).await
}

async fn default_path(State(blog): State<Arc<Blog>>, Path(path): Path<String>) -> Response {
    serve(blog, None, path).await
}

async fn lang_root(State(blog): State<Arc<Blog>>, Path(lang): Path<String>) -> Response {
    serve(blog, Some(lang), String::new()).await
}

async fn lang_path(
    State(blog): State<Arc<Blog>>,
    Path((lang, path)): Path<(String, String)>,
) -> Response {
    serve(blog, Some(lang), path).await
}

/// Render off the async runtime; sources may block on disk or network
async fn serve(blog: Arc<Blog>, lang: Option<String>, path: String) -> Response {
    if let Some(lang) = &lang {
        if !blog.has_language(lang) {
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }
    }

    let result = tokio::task::spawn_blocking(move || blog.render(lang.as_deref(), &path)).await;

    match result {
        Ok(Ok(page)) => {
            ([(header::CONTENT_TYPE, page.media_type.as_str())], page.body).into_response()
        }
        Ok(Err(err)) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!("{}", err);
            }
            (status, status.canonical_reason().unwrap_or("Error")).into_response()
        }
        Err(err) => {
            tracing::error!("Render task failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// HTTP status for a failed render
pub fn status_for(err: &RenderError) -> StatusCode {
    match err.source_kind() {
        Some(SourceErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(SourceErrorKind::Transient) | Some(SourceErrorKind::Malformed) => {
            StatusCode::BAD_GATEWAY
        }
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::render::ContentError;
    use crate::source::{MemorySource, SourceError};
    use std::path::PathBuf;

    fn site() -> Blog {
        let config = SiteConfig {
            languages: vec!["de".to_string()],
            ..SiteConfig::default()
        };
        let source = MemorySource::new()
            .with_file("hello.md", "# Hello")
            .with_file("bad.md", "---\ntitle: [x\n---\n")
            .with_file("raw.bin", vec![0u8, 0xff]);
        Blog::with_source(config, PathBuf::from("."), Arc::new(source)).unwrap()
    }

    fn blog() -> Arc<Blog> {
        Arc::new(site())
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[test]
    fn test_status_for() {
        let not_found = RenderError::Source(SourceError::not_found("a"));
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let transient = RenderError::Source(SourceError::transient("a"));
        assert_eq!(status_for(&transient), StatusCode::BAD_GATEWAY);

        let content = RenderError::from(ContentError::MetadataShape).in_renderer("markdown");
        assert_eq!(status_for(&content), StatusCode::INTERNAL_SERVER_ERROR);

        let unhandled = RenderError::Unhandled {
            path: "a".to_string(),
        };
        assert_eq!(status_for(&unhandled), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_serve_pages() {
        let response = serve(blog(), None, "hello.md".to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");

        let response = serve(blog(), Some("de".to_string()), String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = serve(blog(), None, "raw.bin".to_string()).await;
        assert_eq!(content_type(&response), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serve_errors() {
        let response = serve(blog(), None, "missing.md".to_string()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = serve(blog(), Some("fr".to_string()), "hello.md".to_string()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = serve(blog(), None, "bad.md".to_string()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_router_builds() {
        let _router = router(site());
    }
}
