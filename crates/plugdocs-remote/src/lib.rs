//! Remote repository content sourcing for plugdocs.
//!
//! The pipeline is built from small parts that are wired together by the
//! process entry point:
//!
//! - [`RateLimiter`]: sliding-window ceiling on outbound calls
//! - [`with_retry`]: bounded exponential backoff around any async operation
//! - [`RemoteHost`]: tree/contents/blob API of a repository host, with
//!   [`GitHubHost`] for GitHub and [`MockHost`] for tests (behind `mock`)
//! - [`RemoteFetcher`]: the cache-wrapped entry point that classifies
//!   "not found" as [`Fetched::Absent`] instead of an error
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use plugdocs_cache::MemoryCache;
//! use plugdocs_remote::{GitHubHost, RateLimiter, RemoteFetcher};
//!
//! let host = Arc::new(GitHubHost::new("https://api.github.com", None, Duration::from_secs(30)));
//! let cache = Arc::new(MemoryCache::new());
//! let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(3600), Duration::from_secs(5)));
//! let fetcher = RemoteFetcher::new(host, cache, limiter);
//! let readme = fetcher.fetch_file(&repo, &version, "README.md").await;
//! ```

mod error;
mod fetcher;
mod github;
mod host;
mod limiter;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod retry;

pub use error::{Fetched, RemoteError, RemoteErrorKind};
pub use fetcher::{DEFAULT_TTL, FetcherStats, RemoteFetcher};
pub use github::GitHubHost;
pub use host::{EncodedContent, EntryKind, RemoteHost, Tree, TreeEntry};
pub use limiter::{RateLimitStats, RateLimiter};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockHost;
pub use retry::{RetryPolicy, with_retry};
