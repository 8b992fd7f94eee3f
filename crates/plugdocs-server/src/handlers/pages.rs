//! Pages API endpoint.
//!
//! Handles page loading and returns JSON responses with metadata,
//! table of contents, and HTML content.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use md5::{Digest, Md5};
use plugdocs_compiler::TocEntry;
use plugdocs_site::LoadedPage;
use serde::Serialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Response for GET /api/pages/{path}.
#[derive(Serialize)]
pub struct PageResponse {
    /// Page metadata.
    pub meta: PageMeta,
    /// Table of contents entries.
    pub toc: Vec<TocResponse>,
    /// Compiled HTML content.
    pub content: String,
}

/// Page metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Page title (front matter, then first H1, then the listing title).
    pub title: String,
    /// Site URL of the page.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link to the content file on the repository host.
    pub source_url: String,
    /// Repository slug.
    pub repository: String,
    /// Version label.
    pub version: String,
    /// Whether the page asks for a full-width layout.
    pub full: bool,
    /// Compile error, set when the fallback panel is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageMeta {
    fn new(loaded: &LoadedPage, url: String) -> Self {
        let record = &loaded.record;
        Self {
            title: loaded
                .page
                .title
                .clone()
                .unwrap_or_else(|| record.title.clone()),
            path: url,
            description: loaded.page.description.clone(),
            source_url: loaded.source_url.clone(),
            repository: record.repository.slug().to_owned(),
            version: record.version.clone(),
            full: loaded.page.full,
            error: loaded.page.error.clone(),
        }
    }
}

/// Table of contents entry for serialization.
#[derive(Serialize)]
pub struct TocResponse {
    /// Heading level (2-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID.
    pub id: String,
}

impl From<&TocEntry> for TocResponse {
    fn from(entry: &TocEntry) -> Self {
        Self {
            level: entry.level,
            title: entry.title.clone(),
            id: entry.id.clone(),
        }
    }
}

/// Handle GET /api/pages/{path}.
pub(crate) async fn get_page(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
    let slugs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let loaded = state.site.load_page(&slugs).await?;

    if let Some(error) = &loaded.page.error {
        tracing::warn!(path = %path, error = %error, "Serving fallback page");
    }

    let etag = compute_etag(&state.version, &loaded.html);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let url = state.site.listing().url(&loaded.record);
    let response = PageResponse {
        meta: PageMeta::new(&loaded, url),
        toc: loaded.page.toc.iter().map(TocResponse::from).collect(),
        content: loaded.html,
    };

    Ok((
        [
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        Json(response),
    )
        .into_response())
}

/// Compute `ETag` from version and content.
///
/// Uses MD5 hash truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;

    use crate::handlers::test_support::{get, json, router, send};

    #[test]
    fn test_compute_etag_includes_version() {
        let etag1 = compute_etag("1.0.0", "content");
        let etag2 = compute_etag("1.0.1", "content");
        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_compute_etag_format() {
        let etag = compute_etag("1.0.0", "content");
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert_eq!(etag.len(), 18);
    }

    #[test]
    fn test_page_meta_serializes_camel_case() {
        let meta = PageMeta {
            title: "Setup".to_owned(),
            path: "/docs/widgets/2.x/setup".to_owned(),
            description: None,
            source_url: "https://github.com/acme/widgets/blob/main/docs/setup.md".to_owned(),
            repository: "widgets".to_owned(),
            version: "2.x".to_owned(),
            full: false,
            error: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "title": "Setup",
                "path": "/docs/widgets/2.x/setup",
                "sourceUrl": "https://github.com/acme/widgets/blob/main/docs/setup.md",
                "repository": "widgets",
                "version": "2.x",
                "full": false,
            })
        );
    }

    #[tokio::test]
    async fn test_get_page() {
        let response = send(router().await, get("/api/pages/widgets/2.x/readme")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ETAG));
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "private, max-age=60"
        );
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = json(response).await;
        assert_eq!(body["meta"]["title"], "Widgets");
        assert_eq!(body["meta"]["path"], "/docs/widgets/2.x/readme");
        assert_eq!(
            body["meta"]["sourceUrl"],
            "https://github.com/acme/widgets/blob/main/README.md"
        );
        assert_eq!(body["toc"][0]["id"], "install");
    }

    #[tokio::test]
    async fn test_get_page_not_modified() {
        let router = router().await;
        let first = send(router.clone(), get("/api/pages/widgets/2.x/readme")).await;
        let etag = first.headers()[header::ETAG].clone();

        let request = Request::builder()
            .uri("/api/pages/widgets/2.x/readme")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap();
        let second = send(router, request).await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_get_page_not_found() {
        let response = send(router().await, get("/api/pages/widgets/2.x/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json(response).await;
        assert_eq!(body["error"], "Page not found");
        assert_eq!(body["path"], "widgets/2.x/missing");
    }

    #[tokio::test]
    async fn test_get_page_unresolved_source() {
        let response = send(router().await, get("/api/pages/widgets/2.x/alias")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json(response).await;
        assert_eq!(body["file"], "widgets/2.x/ALIAS.md");
        assert_eq!(
            body["error"],
            "unresolved source in frontmatter of widgets/2.x/ALIAS.md: widgets/2.x/gone"
        );
    }
}
