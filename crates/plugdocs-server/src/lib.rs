//! HTTP server for plugdocs.
//!
//! This crate provides a JSON API over a [`Site`] using axum:
//! - `/api/pages/{*path}`: compiled page with metadata and table of contents
//! - `/api/navigation`: repository, version and page tree
//! - `/api/cache`: cache statistics and clearing
//! - `/api/status`: health check and repository summaries
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use plugdocs_server::{ServerConfig, run_server};
//!
//! let site = Arc::new(Site::new(&config, fetcher)?);
//! run_server(ServerConfig::default(), site).await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum server (plugdocs-server)
//!                        │
//!                        ├─► API routes ──► Site (listing, load, compile)
//!                        │                      │
//!                        │                      └─► RemoteFetcher ──► GitHub
//!                        │
//!                        └─► background tasks: cache sweep, listing refresh
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use plugdocs_site::Site;

pub use app::create_router;
pub use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Application version (part of page ETags).
    pub version: String,
    /// How often expired cache entries are swept.
    pub cache_cleanup_interval: Duration,
    /// How often the page listing is rebuilt, if at all.
    pub refresh_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            version: String::new(),
            cache_cleanup_interval: Duration::from_secs(600),
            refresh_interval: None,
        }
    }
}

impl ServerConfig {
    /// Server configuration from plugdocs config.
    pub fn from_config(config: &plugdocs_config::Config, version: String) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            version,
            cache_cleanup_interval: config.cache.cleanup_interval(),
            refresh_interval: config.aggregation.refresh_interval(),
        }
    }
}

/// Run the server.
///
/// Builds the initial page listing, starts the background tasks and serves
/// until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(
    config: ServerConfig,
    site: Arc<Site>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;

    let pages = site.reload().await;
    tracing::info!(pages, "Initial page listing built");

    let sweeper = site
        .fetcher()
        .cache()
        .spawn_sweeper(config.cache_cleanup_interval);
    let refresh = config
        .refresh_interval
        .map(|interval| site.spawn_refresh(interval));

    let state = Arc::new(AppState {
        site,
        version: config.version.clone(),
    });
    let app = create_router(state);

    tracing::info!(address = %addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    if let Some(refresh) = refresh {
        refresh.abort();
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
