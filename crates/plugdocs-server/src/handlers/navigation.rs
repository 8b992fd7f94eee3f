//! Navigation API endpoint.
//!
//! Returns the navigation tree for the documentation site.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use plugdocs_site::Navigation;

use crate::state::AppState;

/// Handle GET /api/navigation.
pub(crate) async fn get_navigation(State(state): State<Arc<AppState>>) -> Json<Navigation> {
    Json(state.site.navigation())
}
