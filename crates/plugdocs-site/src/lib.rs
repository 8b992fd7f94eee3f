//! Site structure and page loading for plugdocs.
//!
//! This crate provides:
//! - [`Aggregator`]: walks repositories × versions into page records
//! - [`PageListing`]: the slug-indexed result of one aggregation pass
//! - [`LinkResolver`]: rewrites relative links to site pages or the repository host
//! - [`Site`]: owns the listing and loads, compiles and links pages on request
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use plugdocs_site::Site;
//!
//! let site = Arc::new(Site::new(&config, fetcher)?);
//! site.reload().await;
//!
//! let page = site.load_page(&["filament-tree", "3.x", "readme"]).await?;
//! let nav = site.navigation();
//! ```

mod aggregator;
mod links;
mod listing;
mod navigation;
mod site;

pub use aggregator::Aggregator;
pub use links::LinkResolver;
pub use listing::{PageListing, PageRecord, PageSource};
pub use navigation::{NavItem, Navigation, version_title};
pub use site::{LoadedPage, Site};

use plugdocs_remote::RemoteError;

/// Error returned when a page cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// No page at this path, or its content is gone from the remote.
    #[error("Page not found: {0}")]
    PageNotFound(String),
    /// Front matter `source` names a page that does not exist.
    #[error("unresolved source in frontmatter of {file}: {target}")]
    UnresolvedSource { file: String, target: String },
    /// Remote host failure after retries.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// `github.require_token` is set but no token is configured.
    #[error("GitHub token is required but not configured")]
    MissingCredential,
}
