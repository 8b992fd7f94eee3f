//! Page records and the slug-indexed listing built from them.

use std::collections::HashMap;
use std::sync::Arc;

use plugdocs_config::{RepositoryConfig, VersionConfig};

/// Where a page's markdown comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageSource {
    /// Curated file, read through the contents API at the version's branch.
    File {
        /// Path within the repository.
        path: String,
    },
    /// File found by walking the docs directory, read by blob sha.
    Blob {
        /// Path within the repository.
        path: String,
        /// Blob sha from the tree listing.
        sha: String,
    },
}

impl PageSource {
    /// Path of the file within the repository.
    pub fn path(&self) -> &str {
        match self {
            Self::File { path } | Self::Blob { path, .. } => path,
        }
    }
}

/// One routable page produced by an aggregation pass.
///
/// Holds no content: the markdown is fetched when the page is loaded.
#[derive(Clone, Debug)]
pub struct PageRecord {
    /// `[repository, version, rest...]`.
    pub slugs: Vec<String>,
    /// Slugs joined with `/`.
    pub path: String,
    /// Title shown in navigation.
    pub title: String,
    /// Owning repository.
    pub repository: Arc<RepositoryConfig>,
    /// Version label.
    pub version: String,
    /// Branch the content is read from.
    pub branch: String,
    /// Deferred content location.
    pub source: PageSource,
}

impl PageRecord {
    /// Build a record under `repository`/`version` with the given page slugs.
    pub fn new(
        repository: &Arc<RepositoryConfig>,
        version: &VersionConfig,
        page_slugs: impl IntoIterator<Item = String>,
        title: String,
        source: PageSource,
    ) -> Self {
        let slugs: Vec<String> = [repository.slug().to_owned(), version.version.clone()]
            .into_iter()
            .chain(page_slugs)
            .collect();
        Self {
            path: slugs.join("/"),
            slugs,
            title,
            repository: Arc::clone(repository),
            version: version.version.clone(),
            branch: version.branch.clone(),
            source,
        }
    }

    /// Configured version this page belongs to.
    pub fn version_config(&self) -> Option<&VersionConfig> {
        self.repository.version(&self.version)
    }

    /// Path used to identify this page's source for compilation.
    pub fn source_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.repository.slug(),
            self.version,
            self.source.path()
        )
    }

    /// URL of the file on the repository host.
    pub fn remote_url(&self) -> String {
        format!(
            "{}/blob/{}/{}",
            self.repository.repository_url,
            self.branch,
            self.source.path()
        )
    }
}

/// Ordered set of pages from one aggregation pass, indexed by path.
#[derive(Debug, Default)]
pub struct PageListing {
    base_url: String,
    pages: Vec<Arc<PageRecord>>,
    by_path: HashMap<String, usize>,
}

impl PageListing {
    /// Build a listing, keeping the first record for each path.
    pub fn new(base_url: &str, records: Vec<PageRecord>) -> Self {
        let mut pages = Vec::with_capacity(records.len());
        let mut by_path = HashMap::with_capacity(records.len());

        for record in records {
            if by_path.contains_key(&record.path) {
                tracing::warn!(path = %record.path, source = record.source.path(), "Duplicate page path, ignoring");
                continue;
            }
            by_path.insert(record.path.clone(), pages.len());
            pages.push(Arc::new(record));
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            pages,
            by_path,
        }
    }

    /// Look up a page by slugs.
    pub fn get<S: AsRef<str>>(&self, slugs: &[S]) -> Option<&Arc<PageRecord>> {
        let path = slugs
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<&str>>()
            .join("/");
        self.get_path(&path)
    }

    /// Look up a page by `/`-joined path.
    pub fn get_path(&self, path: &str) -> Option<&Arc<PageRecord>> {
        self.by_path.get(path).map(|&idx| &self.pages[idx])
    }

    /// Site URL of a page.
    pub fn url(&self, record: &PageRecord) -> String {
        format!("{}/{}", self.base_url, record.path)
    }

    /// All pages in aggregation order.
    pub fn pages(&self) -> &[Arc<PageRecord>] {
        &self.pages
    }

    /// Pages of one repository version, in aggregation order.
    pub fn version_pages<'a>(
        &'a self,
        repository: &'a str,
        version: &'a str,
    ) -> impl Iterator<Item = &'a Arc<PageRecord>> + 'a {
        self.pages
            .iter()
            .filter(move |p| p.repository.slug() == repository && p.version == version)
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the listing has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugdocs_config::Config;
    use pretty_assertions::assert_eq;

    fn repository() -> Arc<RepositoryConfig> {
        let config = Config::from_toml(
            r#"
[[repositories]]
repository_url = "https://github.com/acme/widgets"
latest_version = "2.x"

[[repositories.versions]]
version = "2.x"
branch = "main"
"#,
        )
        .unwrap();
        Arc::new(config.repositories[0].clone())
    }

    fn record(repo: &Arc<RepositoryConfig>, slugs: &[&str], path: &str) -> PageRecord {
        PageRecord::new(
            repo,
            &repo.versions[0],
            slugs.iter().map(|s| (*s).to_owned()),
            "Title".to_owned(),
            PageSource::File {
                path: path.to_owned(),
            },
        )
    }

    #[test]
    fn test_record_paths() {
        let repo = repository();
        let page = record(&repo, &["guides", "setup"], "docs/guides/setup.md");

        assert_eq!(page.path, "widgets/2.x/guides/setup");
        assert_eq!(page.source_path(), "widgets/2.x/docs/guides/setup.md");
        assert_eq!(
            page.remote_url(),
            "https://github.com/acme/widgets/blob/main/docs/guides/setup.md"
        );
        assert_eq!(page.version_config().unwrap().branch, "main");
    }

    #[test]
    fn test_listing_lookup_and_url() {
        let repo = repository();
        let listing = PageListing::new("/docs/", vec![record(&repo, &["readme"], "README.md")]);

        let page = listing.get(&["widgets", "2.x", "readme"]).unwrap();
        assert_eq!(listing.url(page), "/docs/widgets/2.x/readme");
        assert!(listing.get(&["widgets", "2.x", "missing"]).is_none());
        assert_eq!(listing.version_pages("widgets", "2.x").count(), 1);
    }

    #[test]
    fn test_duplicate_paths_keep_first() {
        let repo = repository();
        let listing = PageListing::new(
            "/docs",
            vec![
                record(&repo, &["readme"], "README.md"),
                record(&repo, &["readme"], "docs/readme.md"),
            ],
        );

        assert_eq!(listing.len(), 1);
        assert_eq!(listing.pages()[0].source.path(), "README.md");
    }
}
