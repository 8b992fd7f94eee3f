//! Navigation tree: repositories, their versions, and version pages.

use std::sync::Arc;

use plugdocs_config::RepositoryConfig;
use serde::Serialize;

use crate::listing::PageListing;

/// Navigation item with children for UI tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Display title.
    pub title: String,
    /// Site URL.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Child navigation items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// Site navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Site title.
    pub title: String,
    /// One item per repository, in configured order.
    pub items: Vec<NavItem>,
}

/// Label of a version in navigation, e.g. `v3.x (Latest)`.
pub fn version_title(repo: &RepositoryConfig, version: &str) -> String {
    if repo.is_latest(version) {
        format!("v{version} (Latest)")
    } else {
        format!("v{version}")
    }
}

pub(crate) fn build_navigation(
    title: &str,
    base_url: &str,
    repositories: &[Arc<RepositoryConfig>],
    listing: &PageListing,
) -> Navigation {
    let base_url = base_url.trim_end_matches('/');
    let items = repositories
        .iter()
        .map(|repo| {
            let repo_path = format!("{base_url}/{}", repo.slug());
            let versions = repo
                .versions
                .iter()
                .map(|version| NavItem {
                    title: version_title(repo, &version.version),
                    path: format!("{repo_path}/{}", version.version),
                    description: None,
                    children: listing
                        .version_pages(repo.slug(), &version.version)
                        .map(|page| NavItem {
                            title: page.title.clone(),
                            path: listing.url(page),
                            description: None,
                            children: Vec::new(),
                        })
                        .collect(),
                })
                .collect();
            NavItem {
                title: repo.display_name.clone(),
                path: repo_path,
                description: repo.description.clone(),
                children: versions,
            }
        })
        .collect();

    Navigation {
        title: title.to_owned(),
        items,
    }
}
