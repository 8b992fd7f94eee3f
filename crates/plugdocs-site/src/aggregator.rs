//! Builds the page set from configured repositories.
//!
//! Each repository version contributes its curated files first, in configured
//! order, followed by the markdown files of its docs directory in tree order.
//! A failing repository version is logged and left out; the rest of the pass
//! continues.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use plugdocs_config::{RepositoryConfig, VersionConfig, title_from_file};
use plugdocs_remote::{EntryKind, Fetched, RemoteError, RemoteFetcher};

use crate::listing::{PageRecord, PageSource};

/// Extensions of files published as pages.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Walks repositories and versions into [`PageRecord`]s.
pub struct Aggregator {
    fetcher: Arc<RemoteFetcher>,
    concurrency: usize,
}

impl Aggregator {
    /// Create an aggregator fetching up to `concurrency` versions at once.
    pub fn new(fetcher: Arc<RemoteFetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Collect pages for every repository version, in configured order.
    pub async fn aggregate(&self, repositories: &[Arc<RepositoryConfig>]) -> Vec<PageRecord> {
        let authenticated = self.fetcher.host().is_authenticated();
        let jobs: Vec<(Arc<RepositoryConfig>, VersionConfig)> = repositories
            .iter()
            .filter(|repo| {
                if repo.private && !authenticated {
                    tracing::warn!(
                        repo = %repo.full_name(),
                        "Skipping private repository, no access token configured"
                    );
                    return false;
                }
                true
            })
            .flat_map(|repo| {
                repo.versions
                    .iter()
                    .map(|version| (Arc::clone(repo), version.clone()))
            })
            .collect();

        let results: Vec<_> = stream::iter(jobs)
            .map(|(repo, version)| async move {
                let result = self.version_pages(&repo, &version).await;
                (repo, version, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut pages = Vec::new();
        for (repo, version, result) in results {
            match result {
                Ok(version_pages) => {
                    tracing::debug!(
                        repo = %repo.full_name(),
                        version = %version.version,
                        count = version_pages.len(),
                        "Collected pages"
                    );
                    pages.extend(version_pages);
                }
                Err(e) => tracing::error!(
                    repo = %repo.full_name(),
                    version = %version.version,
                    error = %e,
                    "Failed to collect pages, skipping"
                ),
            }
        }
        tracing::info!(count = pages.len(), "Aggregated pages");
        pages
    }

    /// Pages of one repository version: curated files, then the docs directory.
    pub async fn version_pages(
        &self,
        repo: &Arc<RepositoryConfig>,
        version: &VersionConfig,
    ) -> Result<Vec<PageRecord>, RemoteError> {
        let mut pages = self.curated_pages(repo, version).await?;
        if let Some(docs_path) = &repo.docs_path {
            pages.extend(self.docs_pages(repo, version, docs_path).await?);
        }
        Ok(pages)
    }

    async fn curated_pages(
        &self,
        repo: &Arc<RepositoryConfig>,
        version: &VersionConfig,
    ) -> Result<Vec<PageRecord>, RemoteError> {
        let mut pages = Vec::with_capacity(version.limited_files.len());
        for file in &version.limited_files {
            match self.fetcher.fetch_file(repo, version, &file.name).await {
                Fetched::Found(_) => pages.push(PageRecord::new(
                    repo,
                    version,
                    [file.slug.clone()],
                    file.title.clone(),
                    PageSource::File {
                        path: file.name.clone(),
                    },
                )),
                Fetched::Absent => {}
                Fetched::Failed(e) => return Err(e),
            }
        }
        Ok(pages)
    }

    async fn docs_pages(
        &self,
        repo: &Arc<RepositoryConfig>,
        version: &VersionConfig,
        docs_path: &str,
    ) -> Result<Vec<PageRecord>, RemoteError> {
        let sha = match self.fetcher.directory_sha(repo, version, docs_path).await {
            Fetched::Found(sha) => sha,
            Fetched::Absent => return Ok(Vec::new()),
            Fetched::Failed(e) => return Err(e),
        };
        let tree = match self.fetcher.tree(repo, &sha, true).await {
            Fetched::Found(tree) => tree,
            Fetched::Absent => return Ok(Vec::new()),
            Fetched::Failed(e) => return Err(e),
        };
        if tree.truncated {
            tracing::warn!(repo = %repo.full_name(), docs_path, "Docs tree listing is truncated");
        }

        let mut pages = Vec::new();
        for entry in &tree.tree {
            if entry.kind != EntryKind::Blob {
                continue;
            }
            let Some((stem, extension)) = entry.path.rsplit_once('.') else {
                continue;
            };
            if extension.eq_ignore_ascii_case("json") {
                tracing::warn!(
                    repo = %repo.full_name(),
                    path = %entry.path,
                    "Skipping JSON file in docs directory, requires manual handling"
                );
                continue;
            }
            if !MARKDOWN_EXTENSIONS
                .iter()
                .any(|ext| extension.eq_ignore_ascii_case(ext))
            {
                continue;
            }

            pages.push(PageRecord::new(
                repo,
                version,
                docs_slugs(stem),
                title_from_file(&entry.path),
                PageSource::Blob {
                    path: format!("{docs_path}/{}", entry.path),
                    sha: entry.sha.clone(),
                },
            ));
        }
        Ok(pages)
    }
}

/// Page slugs for a docs file path without extension.
///
/// Segments are lowercased and a trailing `index` names its directory.
fn docs_slugs(stem: &str) -> Vec<String> {
    let mut slugs: Vec<String> = stem
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect();
    if slugs.last().is_some_and(|s| s == "index") {
        slugs.pop();
    }
    slugs
}
