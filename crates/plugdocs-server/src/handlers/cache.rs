//! Cache admin endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::state::AppState;

/// Query string for admin endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ActionQuery {
    action: Option<String>,
}

impl ActionQuery {
    pub(crate) fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// Handle GET /api/cache.
pub(crate) async fn get_cache(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
) -> Json<Value> {
    let fetcher = state.site.fetcher();
    match query.action() {
        Some("stats") => {
            let stats = fetcher.stats();
            Json(json!({
                "cache": stats.cache,
                "rate_limit": stats.rate_limit,
                "pages": state.site.listing().len(),
                "compiled_pages": state.site.compiler().len(),
            }))
        }
        Some("clear") => {
            fetcher.clear_cache();
            tracing::info!("Cache cleared via API");
            Json(json!({"message": "In-memory cache cleared successfully"}))
        }
        _ => Json(json!({
            "message": "Cache API",
            "available_actions": ["stats", "clear"],
        })),
    }
}
