//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use plugdocs_site::Site;

/// Application state shared across all handlers.
pub struct AppState {
    /// Site with the current page listing.
    pub site: Arc<Site>,
    /// Application version for `ETag`s.
    pub version: String,
}
