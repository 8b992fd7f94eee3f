//! Page listing, page loading and navigation for the configured repositories.
//!
//! # Thread Safety
//!
//! `listing()` returns `Arc<PageListing>` with minimal locking (just Arc
//! clone). `reload()` builds a new listing without holding the lock and swaps
//! it in when done, so readers never wait on the network.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use plugdocs_compiler::{CompiledPage, Compiler};
use plugdocs_config::{Config, RepositoryConfig, VersionConfig};
use plugdocs_remote::{Fetched, RemoteFetcher};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::SiteError;
use crate::aggregator::Aggregator;
use crate::links::LinkResolver;
use crate::listing::{PageListing, PageRecord, PageSource};
use crate::navigation::{Navigation, build_navigation};

/// A page ready to render.
#[derive(Clone, Debug)]
pub struct LoadedPage {
    /// Requested page.
    pub record: Arc<PageRecord>,
    /// Compiled content. Comes from the `source` page when one is set.
    pub page: Arc<CompiledPage>,
    /// Compiled HTML with links rewritten.
    pub html: String,
    /// URL of the content's file on the repository host.
    pub source_url: String,
}

/// Documentation site built from remote repositories.
pub struct Site {
    fetcher: Arc<RemoteFetcher>,
    compiler: Compiler,
    aggregator: Aggregator,
    repositories: Vec<Arc<RepositoryConfig>>,
    base_url: String,
    title: String,
    listing: RwLock<Arc<PageListing>>,
}

impl Site {
    /// Create a site with an empty listing. Call [`Site::reload`] to populate it.
    pub fn new(config: &Config, fetcher: Arc<RemoteFetcher>) -> Result<Self, SiteError> {
        if config.github.require_token && config.github.token().is_none() {
            return Err(SiteError::MissingCredential);
        }
        let base_url = config.site.base_url.trim_end_matches('/').to_owned();

        Ok(Self {
            aggregator: Aggregator::new(Arc::clone(&fetcher), config.aggregation.concurrency),
            fetcher,
            compiler: Compiler::new(),
            repositories: config.repositories.iter().cloned().map(Arc::new).collect(),
            listing: RwLock::new(Arc::new(PageListing::new(&base_url, Vec::new()))),
            base_url,
            title: config.site.title.clone(),
        })
    }

    /// Run an aggregation pass and replace the listing. Returns the page count.
    pub async fn reload(&self) -> usize {
        let records = self.aggregator.aggregate(&self.repositories).await;
        let listing = Arc::new(PageListing::new(&self.base_url, records));
        let count = listing.len();
        *self.listing.write().unwrap() = listing;
        count
    }

    /// Reload every `interval` on the tokio runtime.
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let site = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let pages = site.reload().await;
                tracing::info!(pages, "Refreshed page listing");
            }
        })
    }

    /// Current page listing.
    pub fn listing(&self) -> Arc<PageListing> {
        Arc::clone(&self.listing.read().unwrap())
    }

    /// Site title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fetcher(&self) -> &Arc<RemoteFetcher> {
        &self.fetcher
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Configured repositories, in order.
    pub fn repositories(&self) -> &[Arc<RepositoryConfig>] {
        &self.repositories
    }

    /// Find a repository by repo slug or display slug.
    pub fn repository(&self, slug: &str) -> Option<&Arc<RepositoryConfig>> {
        self.repositories.iter().find(|r| r.matches_slug(slug))
    }

    /// Find a repository version, falling back to its latest, then first version.
    pub fn version(
        &self,
        repo_slug: &str,
        version_slug: Option<&str>,
    ) -> Option<(&Arc<RepositoryConfig>, &VersionConfig)> {
        let repo = self.repository(repo_slug)?;
        let version = repo.version_by_slug(version_slug)?;
        Some((repo, version))
    }

    /// Look up a page record.
    pub fn page<S: AsRef<str>>(&self, slugs: &[S]) -> Option<Arc<PageRecord>> {
        self.listing().get(slugs).map(Arc::clone)
    }

    /// Fetch the raw markdown of a page.
    pub async fn load_source(&self, record: &PageRecord) -> Result<String, SiteError> {
        let fetched = match &record.source {
            PageSource::File { path } => {
                let Some(version) = record.version_config() else {
                    return Err(SiteError::PageNotFound(record.path.clone()));
                };
                self.fetcher
                    .fetch_file(&record.repository, version, path)
                    .await
            }
            PageSource::Blob { sha, .. } => self.fetcher.fetch_blob(&record.repository, sha).await,
        };
        match fetched {
            Fetched::Found(content) => Ok(content),
            Fetched::Absent => Err(SiteError::PageNotFound(record.path.clone())),
            Fetched::Failed(e) => Err(SiteError::Remote(e)),
        }
    }

    /// Load and compile a page.
    ///
    /// A page whose front matter sets `source` shows the compiled content of
    /// that page instead. Only one such hop is followed.
    pub async fn load_page<S: AsRef<str>>(&self, slugs: &[S]) -> Result<LoadedPage, SiteError> {
        let listing = self.listing();
        let record = listing
            .get(slugs)
            .map(Arc::clone)
            .ok_or_else(|| SiteError::PageNotFound(join_slugs(slugs)))?;

        let mut content_record = Arc::clone(&record);
        let mut page = self.compile_record(&record).await?;
        if let Some(source) = page.source.clone() {
            let target: Vec<&str> = source
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            content_record = listing.get(&target).map(Arc::clone).ok_or_else(|| {
                SiteError::UnresolvedSource {
                    file: record.source_path(),
                    target: source.clone(),
                }
            })?;
            page = self.compile_record(&content_record).await?;
        }

        let html = LinkResolver::new(&listing, &self.repositories)
            .rewrite_html(&page.html, &content_record.slugs);
        Ok(LoadedPage {
            source_url: content_record.remote_url(),
            record,
            page,
            html,
        })
    }

    async fn compile_record(&self, record: &PageRecord) -> Result<Arc<CompiledPage>, SiteError> {
        let source = self.load_source(record).await?;
        Ok(self.compiler.compile(&record.source_path(), &source))
    }

    /// Navigation tree for the current listing.
    pub fn navigation(&self) -> Navigation {
        build_navigation(
            &self.title,
            &self.base_url,
            &self.repositories,
            &self.listing(),
        )
    }
}

fn join_slugs<S: AsRef<str>>(slugs: &[S]) -> String {
    slugs
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join("/")
}
