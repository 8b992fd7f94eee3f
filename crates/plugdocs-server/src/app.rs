//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::middleware::map_response;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/navigation", get(handlers::navigation::get_navigation))
        .route("/api/pages/{*path}", get(handlers::pages::get_page))
        .route("/api/cache", get(handlers::cache::get_cache))
        .route("/api/status", get(handlers::status::get_status))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(map_response(security::security_headers)),
        )
        .with_state(state)
}
