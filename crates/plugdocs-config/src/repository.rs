//! Repository, version and curated file definitions.

use serde::Deserialize;

use crate::ConfigError;
use crate::naming::{display_name_from_repo, file_slug, slugify_words, title_from_file};

/// Raw `[[repositories]]` entry as parsed from TOML.
#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryRaw {
    /// `https://github.com/owner/repo` or the `owner/repo` shorthand.
    #[serde(alias = "repository")]
    repository_url: String,
    display_name: Option<String>,
    description: Option<String>,
    latest_version: Option<String>,
    #[serde(default, alias = "is_private")]
    private: bool,
    #[serde(alias = "docsPath")]
    docs_path: Option<String>,
    #[serde(default)]
    versions: Vec<VersionRaw>,
}

#[derive(Debug, Deserialize)]
struct VersionRaw {
    version: String,
    #[serde(alias = "github_branch")]
    branch: Option<String>,
    #[serde(default)]
    limited_files: Vec<LimitedFileRaw>,
}

#[derive(Debug, Deserialize)]
struct LimitedFileRaw {
    name: String,
    title: Option<String>,
    slug: Option<String>,
}

/// One external documentation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Canonical web URL, e.g. `https://github.com/solutionforest/filament-tree`.
    pub repository_url: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name. Doubles as the routing slug.
    pub repo: String,
    /// Name shown in navigation.
    pub display_name: String,
    /// Optional description shown in navigation.
    pub description: Option<String>,
    /// Version label treated as latest.
    pub latest_version: Option<String>,
    /// Private repositories are skipped when no token is configured.
    pub private: bool,
    /// Optional docs directory walked in addition to curated files.
    pub docs_path: Option<String>,
    /// Version lines in configured order.
    pub versions: Vec<VersionConfig>,
}

impl RepositoryConfig {
    /// Routing slug (the repository name).
    pub fn slug(&self) -> &str {
        &self.repo
    }

    /// Slug form of the display name.
    pub fn display_slug(&self) -> String {
        slugify_words(&self.display_name)
    }

    /// `owner/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Whether `slug` names this repository, by repo slug or display slug.
    pub fn matches_slug(&self, slug: &str) -> bool {
        self.repo == slug || self.display_slug() == slug
    }

    /// Find a version by label.
    pub fn version(&self, label: &str) -> Option<&VersionConfig> {
        self.versions.iter().find(|v| v.version == label)
    }

    /// Version for a routing slug, falling back to the latest, then the first.
    ///
    /// `None` only when the repository has no versions.
    pub fn version_by_slug(&self, slug: Option<&str>) -> Option<&VersionConfig> {
        let found = match slug {
            Some(slug) => self.version(slug),
            None => self
                .latest_version
                .as_deref()
                .and_then(|latest| self.version(latest)),
        };
        found.or_else(|| self.versions.first())
    }

    /// Whether `version` is the configured latest version.
    pub fn is_latest(&self, version: &str) -> bool {
        self.latest_version.as_deref() == Some(version)
    }
}

/// One version line of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConfig {
    /// Version label used as the routing slug, e.g. `3.x`.
    pub version: String,
    /// Source branch or ref.
    pub branch: String,
    /// Curated files published for this version, in order.
    pub limited_files: Vec<LimitedFile>,
}

/// Curated file published under a fixed slug and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedFile {
    /// Path of the file in the repository, e.g. `README.md`.
    pub name: String,
    /// Page title.
    pub title: String,
    /// Page slug.
    pub slug: String,
}

/// Split a repository reference into `(owner, repo)`.
///
/// Accepts `https://github.com/owner/repo[.git][/...]` style URLs on any host
/// and the bare `owner/repo` shorthand.
pub(crate) fn parse_repository_url(url: &str) -> Result<(String, String), ConfigError> {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => url,
    };
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if repo.is_empty() {
                return Err(invalid_url(url));
            }
            Ok((owner.to_owned(), repo.to_owned()))
        }
        _ => Err(invalid_url(url)),
    }
}

fn invalid_url(url: &str) -> ConfigError {
    ConfigError::Validation(format!("Invalid repository URL: {url}"))
}

impl RepositoryRaw {
    /// Resolve into a [`RepositoryConfig`], filling derived fields.
    pub(crate) fn resolve(self, web_url: &str) -> Result<RepositoryConfig, ConfigError> {
        let (owner, repo) = parse_repository_url(&self.repository_url)?;
        let repository_url = if self.repository_url.contains("://") {
            self.repository_url
                .trim_end_matches('/')
                .trim_end_matches(".git")
                .to_owned()
        } else {
            format!("{}/{owner}/{repo}", web_url.trim_end_matches('/'))
        };

        let versions = self
            .versions
            .into_iter()
            .map(VersionRaw::resolve)
            .collect();

        Ok(RepositoryConfig {
            repository_url,
            display_name: self
                .display_name
                .unwrap_or_else(|| display_name_from_repo(&repo)),
            owner,
            repo,
            description: self.description,
            latest_version: self.latest_version,
            private: self.private,
            docs_path: self
                .docs_path
                .map(|p| p.trim_matches('/').to_owned())
                .filter(|p| !p.is_empty()),
            versions,
        })
    }
}

impl VersionRaw {
    fn resolve(self) -> VersionConfig {
        VersionConfig {
            branch: self.branch.unwrap_or_else(|| self.version.clone()),
            version: self.version,
            limited_files: self
                .limited_files
                .into_iter()
                .map(|file| LimitedFile {
                    title: file.title.unwrap_or_else(|| title_from_file(&file.name)),
                    slug: file.slug.unwrap_or_else(|| file_slug(&file.name)),
                    name: file.name,
                })
                .collect(),
        }
    }
}
