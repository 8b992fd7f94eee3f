//! Rewrites relative links in compiled pages.
//!
//! A relative link is resolved against the directory of the current page in
//! slug space. When it names a page of the listing, it becomes that page's site
//! URL. Otherwise it points at the file on the repository host.
//!
//! The host fallback appends the link exactly as written. `.` and `..` are only
//! applied when looking up site pages, so `./missing` falls back to
//! `{repository}/blob/{branch}/./missing`.

use std::sync::{Arc, LazyLock};

use plugdocs_config::RepositoryConfig;
use regex::{Captures, Regex};

use crate::listing::PageListing;

static ANCHOR_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<a\s[^>]*?\bhref=")([^"]*)(")"#).unwrap());

/// Branch used in host URLs when a version has none.
const DEFAULT_BRANCH: &str = "main";

/// Resolves links against one page listing.
pub struct LinkResolver<'a> {
    listing: &'a PageListing,
    repositories: &'a [Arc<RepositoryConfig>],
}

impl<'a> LinkResolver<'a> {
    pub fn new(listing: &'a PageListing, repositories: &'a [Arc<RepositoryConfig>]) -> Self {
        Self {
            listing,
            repositories,
        }
    }

    /// Resolve `href` found in the page at `current_slugs`.
    pub fn resolve<S: AsRef<str>>(&self, href: &str, current_slugs: &[S]) -> String {
        if is_external(href) || current_slugs.len() < 2 {
            return href.to_owned();
        }
        let repo_slug = current_slugs[0].as_ref();
        let version_slug = current_slugs[1].as_ref();
        let Some(repo) = self
            .repositories
            .iter()
            .find(|r| r.matches_slug(repo_slug))
        else {
            return href.to_owned();
        };
        let Some(version) = repo.version(version_slug) else {
            return href.to_owned();
        };

        let (target, fragment) = match href.split_once('#') {
            Some((target, fragment)) => (target, Some(fragment)),
            None => (href, None),
        };
        let cleaned = strip_markdown_extension(target).to_lowercase();

        let mut parts: Vec<&str> = current_slugs
            .get(2..current_slugs.len() - 1)
            .unwrap_or_default()
            .iter()
            .map(|s| s.as_ref())
            .collect();
        for segment in cleaned.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                segment => parts.push(segment),
            }
        }

        let mut resolved = vec![repo_slug, version_slug];
        resolved.extend(parts);
        if let Some(page) = self.listing.get(&resolved) {
            let url = self.listing.url(page);
            return match fragment {
                Some(fragment) => format!("{url}#{fragment}"),
                None => url,
            };
        }

        let branch = if version.branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            version.branch.as_str()
        };
        format!("{}/blob/{branch}/{href}", repo.repository_url)
    }

    /// Apply [`LinkResolver::resolve`] to every anchor `href` in `html`.
    pub fn rewrite_html<S: AsRef<str>>(&self, html: &str, current_slugs: &[S]) -> String {
        ANCHOR_HREF_RE
            .replace_all(html, |caps: &Captures<'_>| {
                let href = unescape_amp(&caps[2]);
                let resolved = self.resolve(&href, current_slugs);
                format!("{}{}{}", &caps[1], escape_attr(&resolved), &caps[3])
            })
            .into_owned()
    }
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("//")
        || href.starts_with("mailto:")
        || href.starts_with('#')
}

fn strip_markdown_extension(path: &str) -> &str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".mdx") {
        &path[..path.len() - 4]
    } else if lower.ends_with(".md") {
        &path[..path.len() - 3]
    } else {
        path
    }
}

fn unescape_amp(href: &str) -> String {
    href.replace("&amp;", "&")
}

fn escape_attr(href: &str) -> String {
    href.replace('&', "&amp;").replace('"', "&quot;")
}
