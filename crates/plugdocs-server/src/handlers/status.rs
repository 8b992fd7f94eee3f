//! Status endpoint: health check and repository summaries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use crate::handlers::cache::ActionQuery;
use crate::state::AppState;

/// Repository summary for `?action=plugins`.
#[derive(Serialize)]
struct PluginSummary<'a> {
    name: &'a str,
    slug: &'a str,
    description: Option<&'a str>,
    latest_version: Option<&'a str>,
    versions: usize,
}

/// Handle GET /api/status.
pub(crate) async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
) -> Json<Value> {
    let site = &state.site;
    match query.action() {
        Some("health") => Json(json!({
            "status": "healthy",
            "remote": site.fetcher().host().name(),
            "github_token": site.fetcher().host().is_authenticated(),
            "repositories_count": site.repositories().len(),
            "version": state.version,
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Some("plugins") => {
            let plugins: Vec<PluginSummary<'_>> = site
                .repositories()
                .iter()
                .map(|repo| PluginSummary {
                    name: &repo.display_name,
                    slug: repo.slug(),
                    description: repo.description.as_deref(),
                    latest_version: repo.latest_version.as_deref(),
                    versions: repo.versions.len(),
                })
                .collect();
            Json(json!({ "plugins": plugins }))
        }
        _ => Json(json!({
            "message": "Status API",
            "available_actions": ["health", "plugins"],
        })),
    }
}
