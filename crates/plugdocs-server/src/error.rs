//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plugdocs_site::SiteError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Page loading failed.
    #[error(transparent)]
    Site(#[from] SiteError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Site(SiteError::PageNotFound(path)) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Page not found", "path": path}),
            ),
            Self::Site(e @ SiteError::UnresolvedSource { file, .. }) => {
                tracing::error!(error = %e, "Unresolved page source");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": e.to_string(), "file": file}),
                )
            }
            Self::Site(e) => {
                tracing::error!(error = %e, "Failed to load page");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": e.to_string()}),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
