//! Site wiring shared by commands.

use std::sync::Arc;

use plugdocs_cache::MemoryCache;
use plugdocs_config::Config;
use plugdocs_remote::{GitHubHost, RateLimiter, RemoteFetcher, RetryPolicy};
use plugdocs_site::Site;

use crate::error::CliError;

/// Build a site over the GitHub host with the configured cache, rate limit
/// and retry policy. The listing is empty until reloaded.
pub(crate) fn build_site(config: &Config) -> Result<Arc<Site>, CliError> {
    let host = GitHubHost::new(
        &config.github.api_url,
        config.github.token(),
        config.github.timeout(),
    );
    let limiter = RateLimiter::new(
        config.rate_limit.max_requests,
        config.rate_limit.window(),
        config.rate_limit.poll_interval(),
    );
    let fetcher = RemoteFetcher::new(
        Arc::new(host),
        Arc::new(MemoryCache::new()),
        Arc::new(limiter),
    )
    .with_retry_policy(RetryPolicy {
        max_retries: config.retry.max_retries,
        base_delay: config.retry.base_delay(),
    })
    .with_ttl(config.cache.ttl());

    if config.github.token().is_none() {
        tracing::warn!("No GitHub token configured, private repositories are skipped");
    }

    Ok(Arc::new(Site::new(config, Arc::new(fetcher))?))
}
