//! Cached, rate-limited, retried access to repository content.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use plugdocs_cache::{CacheExt, CacheStats, MemoryCache};
use plugdocs_config::{RepositoryConfig, VersionConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Fetched, RemoteError};
use crate::host::{EntryKind, RemoteHost, Tree};
use crate::limiter::{RateLimitStats, RateLimiter};
use crate::retry::{RetryPolicy, with_retry};

/// Default time-to-live for fetched content.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Combined cache and rate limit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetcherStats {
    /// Memory cache occupancy.
    pub cache: CacheStats,
    /// Rate limiter usage.
    pub rate_limit: RateLimitStats,
}

/// Resolves trees and file content from a [`RemoteHost`].
///
/// Every network call goes through [`RemoteFetcher::fetch_with_cache`]: cache
/// lookup, then a rate limit slot, then the retried call, then a cache write.
/// A missing file or directory is reported as [`Fetched::Absent`] and is not
/// retried.
pub struct RemoteFetcher {
    host: Arc<dyn RemoteHost>,
    cache: Arc<MemoryCache>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    ttl: Duration,
}

/// Turn a not-found error into `Ok(None)` so the retry executor sees success.
fn absent_if_not_found<T>(result: Result<T, RemoteError>) -> Result<Option<T>, RemoteError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

impl RemoteFetcher {
    /// Create a fetcher with the default retry policy and TTL.
    pub fn new(host: Arc<dyn RemoteHost>, cache: Arc<MemoryCache>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            host,
            cache,
            limiter,
            retry: RetryPolicy::default(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the cache TTL for fetched content.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The underlying host.
    pub fn host(&self) -> &dyn RemoteHost {
        self.host.as_ref()
    }

    /// The shared memory cache.
    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    /// Cache-wrapped fetch.
    ///
    /// On a hit the cached value is returned without touching the network. On
    /// a miss the call waits for a rate limit slot, runs `operation` through
    /// the retry executor and caches a `Some` result for `ttl`. `None` results
    /// (absent resources) are not cached.
    pub async fn fetch_with_cache<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        operation: F,
    ) -> Result<Option<T>, RemoteError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, RemoteError>>,
    {
        if let Some(value) = self.cache.get_json::<T>(key) {
            tracing::debug!(key, "Cache hit");
            return Ok(Some(value));
        }
        tracing::debug!(key, "Cache miss");

        self.limiter.wait_for_slot().await;
        let value = with_retry(self.retry, operation).await?;
        if let Some(value) = &value {
            self.cache.set_json(key, value, ttl);
        }
        Ok(value)
    }

    /// List a tree by ref or sha.
    pub async fn tree(&self, repo: &RepositoryConfig, tree_ish: &str, recursive: bool) -> Fetched<Tree> {
        let key = format!(
            "github-tree:{}:{}:{tree_ish}:{recursive}",
            repo.owner, repo.repo
        );
        let host = self.host.as_ref();
        let (owner, name) = (repo.owner.as_str(), repo.repo.as_str());

        let result = self
            .fetch_with_cache(&key, self.ttl, || async move {
                absent_if_not_found(host.tree(owner, name, tree_ish, recursive).await)
            })
            .await;
        Fetched::from_result(result)
    }

    /// Resolve the tree sha of a directory at a version's branch.
    ///
    /// Walks one tree level per `/`-separated segment. Every segment must be a
    /// directory; a missing one yields [`Fetched::Absent`].
    pub async fn directory_sha(
        &self,
        repo: &RepositoryConfig,
        version: &VersionConfig,
        path: &str,
    ) -> Fetched<String> {
        let key = format!(
            "github:{}/{}:{}:{path}",
            repo.owner, repo.repo, version.branch
        );
        if let Some(sha) = self.cache.get_json::<String>(&key) {
            tracing::debug!(key, "Cache hit");
            return Fetched::Found(sha);
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Fetched::Absent;
        }

        let mut tree_ish = version.branch.clone();
        for segment in segments {
            let tree = match self.tree(repo, &tree_ish, false).await {
                Fetched::Found(tree) => tree,
                Fetched::Absent => return Fetched::Absent,
                Fetched::Failed(e) => return Fetched::Failed(e),
            };
            match tree.entry(segment) {
                Some(entry) if entry.kind == EntryKind::Tree => tree_ish.clone_from(&entry.sha),
                _ => {
                    tracing::warn!(
                        repo = %repo.full_name(),
                        branch = %version.branch,
                        segment,
                        path,
                        "Directory not found"
                    );
                    return Fetched::Absent;
                }
            }
        }

        self.cache.set_json(&key, &tree_ish, self.ttl);
        Fetched::Found(tree_ish)
    }

    /// Fetch and decode one file at a version's branch.
    pub async fn fetch_file(
        &self,
        repo: &RepositoryConfig,
        version: &VersionConfig,
        path: &str,
    ) -> Fetched<String> {
        let key = format!(
            "github:{}/{}:{}:{path}",
            repo.owner, repo.repo, version.branch
        );
        let host = self.host.as_ref();
        let (owner, name, branch) = (
            repo.owner.as_str(),
            repo.repo.as_str(),
            version.branch.as_str(),
        );

        let result = self
            .fetch_with_cache(&key, self.ttl, || async move {
                match host.contents(owner, name, path, branch).await {
                    Ok(content) => content.decode().map(Some),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await;

        let fetched = Fetched::from_result(result);
        match &fetched {
            Fetched::Absent => tracing::info!(
                repo = %repo.full_name(),
                branch,
                path,
                "File not found, skipping"
            ),
            Fetched::Failed(e) => tracing::warn!(
                repo = %repo.full_name(),
                branch,
                path,
                error = %e,
                "Failed to fetch file"
            ),
            Fetched::Found(_) => {}
        }
        fetched
    }

    /// Fetch and decode a blob by sha.
    pub async fn fetch_blob(&self, repo: &RepositoryConfig, sha: &str) -> Fetched<String> {
        let key = format!("github-blob:{}:{}:{sha}", repo.owner, repo.repo);
        let host = self.host.as_ref();
        let (owner, name) = (repo.owner.as_str(), repo.repo.as_str());

        let result = self
            .fetch_with_cache(&key, self.ttl, || async move {
                match host.blob(owner, name, sha).await {
                    Ok(content) => content.decode().map(Some),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await;
        Fetched::from_result(result)
    }

    /// Cache and rate limit statistics.
    pub fn stats(&self) -> FetcherStats {
        FetcherStats {
            cache: self.cache.stats(),
            rate_limit: self.limiter.stats(),
        }
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockHost;
    use crate::error::RemoteErrorKind;
    use pretty_assertions::assert_eq;

    fn repo() -> RepositoryConfig {
        RepositoryConfig {
            repository_url: "https://github.com/acme/widgets".to_owned(),
            owner: "acme".to_owned(),
            repo: "widgets".to_owned(),
            display_name: "Widgets".to_owned(),
            description: None,
            latest_version: None,
            private: false,
            docs_path: Some("docs/plugins".to_owned()),
            versions: vec![version()],
        }
    }

    fn version() -> VersionConfig {
        VersionConfig {
            version: "1.x".to_owned(),
            branch: "main".to_owned(),
            limited_files: Vec::new(),
        }
    }

    fn host() -> MockHost {
        MockHost::new()
            .with_file("acme", "widgets", "main", "README.md", "# Widgets")
            .with_file("acme", "widgets", "main", "docs/plugins/intro.md", "# Intro")
            .with_file("acme", "widgets", "main", "docs/plugins/api/auth.md", "# Auth")
    }

    fn fetcher(host: Arc<MockHost>) -> RemoteFetcher {
        RemoteFetcher::new(
            host,
            Arc::new(MemoryCache::new()),
            Arc::new(RateLimiter::new(
                50,
                Duration::from_secs(3600),
                Duration::from_secs(5),
            )),
        )
        .with_retry_policy(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_file_caches_content() {
        let host = Arc::new(host());
        let fetcher = fetcher(Arc::clone(&host));

        let first = fetcher.fetch_file(&repo(), &version(), "README.md").await;
        let second = fetcher.fetch_file(&repo(), &version(), "README.md").await;

        assert_eq!(first.into_result().unwrap().as_deref(), Some("# Widgets"));
        assert_eq!(second.into_result().unwrap().as_deref(), Some("# Widgets"));
        assert_eq!(host.contents_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_file_refetches_after_ttl() {
        let host = Arc::new(host());
        let fetcher = fetcher(Arc::clone(&host)).with_ttl(Duration::from_secs(60));

        let _ = fetcher.fetch_file(&repo(), &version(), "README.md").await;
        host.update_file("acme", "widgets", "main", "README.md", "# Widgets v2");
        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = fetcher.fetch_file(&repo(), &version(), "README.md").await;

        assert_eq!(
            refreshed.into_result().unwrap().as_deref(),
            Some("# Widgets v2")
        );
        assert_eq!(host.contents_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_file_is_absent_without_retry() {
        let host = Arc::new(host());
        let fetcher = fetcher(Arc::clone(&host));

        let fetched = fetcher.fetch_file(&repo(), &version(), "CHANGELOG.md").await;

        assert!(matches!(fetched, Fetched::Absent));
        assert_eq!(host.contents_calls(), 1);
        // Absence is not cached.
        let _ = fetcher.fetch_file(&repo(), &version(), "CHANGELOG.md").await;
        assert_eq!(host.contents_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let host = Arc::new(host().with_transient_failures(2));
        let fetcher = fetcher(Arc::clone(&host));

        let fetched = fetcher.fetch_file(&repo(), &version(), "README.md").await;

        assert!(fetched.is_found());
        assert_eq!(host.contents_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_exhausts_retries() {
        let host = Arc::new(host().with_failure("acme", "widgets"));
        let fetcher = fetcher(Arc::clone(&host));

        let fetched = fetcher.fetch_file(&repo(), &version(), "README.md").await;

        match fetched {
            Fetched::Failed(e) => assert_eq!(e.kind, RemoteErrorKind::Unavailable),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(host.contents_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_directory_sha_walks_segments() {
        let host = Arc::new(host());
        let fetcher = fetcher(Arc::clone(&host));

        let sha = fetcher
            .directory_sha(&repo(), &version(), "docs/plugins")
            .await
            .into_result()
            .unwrap();

        assert_eq!(sha.as_deref(), Some("tree:main:docs/plugins"));
        assert_eq!(host.tree_calls(), 2);

        // The resolved sha is cached as a whole.
        let _ = fetcher.directory_sha(&repo(), &version(), "docs/plugins").await;
        assert_eq!(host.tree_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_directory_sha_missing_segment_is_absent() {
        let fetcher = fetcher(Arc::new(host()));

        let missing_middle = fetcher.directory_sha(&repo(), &version(), "docs/missing/api").await;
        let file_not_dir = fetcher.directory_sha(&repo(), &version(), "README.md").await;

        assert!(matches!(missing_middle, Fetched::Absent));
        assert!(matches!(file_not_dir, Fetched::Absent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_blob_from_recursive_tree() {
        let fetcher = fetcher(Arc::new(host()));
        let tree = fetcher
            .tree(&repo(), "tree:main:docs/plugins", true)
            .await
            .into_result()
            .unwrap()
            .unwrap();
        let entry = tree.entry("api/auth.md").unwrap();

        let content = fetcher.fetch_blob(&repo(), &entry.sha).await;

        assert_eq!(content.into_result().unwrap().as_deref(), Some("# Auth"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_and_clear() {
        let fetcher = fetcher(Arc::new(host()));
        let _ = fetcher.fetch_file(&repo(), &version(), "README.md").await;

        let stats = fetcher.stats();
        assert_eq!(stats.cache.active, 1);
        assert_eq!(stats.rate_limit.requests_in_window, 1);

        fetcher.clear_cache();
        assert_eq!(fetcher.stats().cache.total, 0);
    }
}
