//! Mock remote host for testing.
//!
//! Provides [`MockHost`] for exercising the fetch pipeline without network
//! access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteErrorKind};
use crate::host::{EncodedContent, EntryKind, RemoteHost, Tree, TreeEntry};

type RepoKey = (String, String);

/// In-memory repository host.
///
/// Files are registered per `owner/repo` and ref. Tree and blob shas are
/// synthetic (`tree:{ref}:{dir}` and `blob:{ref}:{path}`) so they can be
/// resolved back without extra bookkeeping.
///
/// # Example
///
/// ```ignore
/// use plugdocs_remote::MockHost;
///
/// let host = MockHost::new()
///     .with_file("acme", "widgets", "main", "README.md", "# Widgets")
///     .with_file("acme", "widgets", "main", "docs/intro.md", "# Intro");
/// ```
#[derive(Debug, Default)]
pub struct MockHost {
    files: RwLock<HashMap<RepoKey, HashMap<String, BTreeMap<String, String>>>>,
    failing: RwLock<HashSet<RepoKey>>,
    transient_failures: AtomicUsize,
    authenticated: bool,
    tree_calls: AtomicUsize,
    contents_calls: AtomicUsize,
    blob_calls: AtomicUsize,
}

impl MockHost {
    /// Create an empty mock host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `path` on `git_ref`.
    #[must_use]
    pub fn with_file(
        self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
        content: &str,
    ) -> Self {
        self.files
            .write()
            .unwrap()
            .entry((owner.to_owned(), repo.to_owned()))
            .or_default()
            .entry(git_ref.to_owned())
            .or_default()
            .insert(path.to_owned(), content.to_owned());
        self
    }

    /// Make every call for `owner/repo` fail with [`RemoteErrorKind::Unavailable`].
    #[must_use]
    pub fn with_failure(self, owner: &str, repo: &str) -> Self {
        self.failing
            .write()
            .unwrap()
            .insert((owner.to_owned(), repo.to_owned()));
        self
    }

    /// Fail the next `count` calls with [`RemoteErrorKind::Unavailable`].
    #[must_use]
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Report requests as authenticated.
    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Replace a file's content (simulates a push).
    pub fn update_file(&self, owner: &str, repo: &str, git_ref: &str, path: &str, content: &str) {
        self.files
            .write()
            .unwrap()
            .entry((owner.to_owned(), repo.to_owned()))
            .or_default()
            .entry(git_ref.to_owned())
            .or_default()
            .insert(path.to_owned(), content.to_owned());
    }

    /// Number of tree calls made.
    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }

    /// Number of contents calls made.
    pub fn contents_calls(&self) -> usize {
        self.contents_calls.load(Ordering::SeqCst)
    }

    /// Number of blob calls made.
    pub fn blob_calls(&self) -> usize {
        self.blob_calls.load(Ordering::SeqCst)
    }

    /// Total number of calls made.
    pub fn total_calls(&self) -> usize {
        self.tree_calls() + self.contents_calls() + self.blob_calls()
    }

    fn check_failure(&self, owner: &str, repo: &str) -> Result<(), RemoteError> {
        let resource = format!("{owner}/{repo}");
        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient
            || self
                .failing
                .read()
                .unwrap()
                .contains(&(owner.to_owned(), repo.to_owned()))
        {
            return Err(RemoteError::new(RemoteErrorKind::Unavailable)
                .with_status(503)
                .with_resource(resource));
        }
        Ok(())
    }

    fn read_file(&self, owner: &str, repo: &str, git_ref: &str, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(&(owner.to_owned(), repo.to_owned()))?
            .get(git_ref)?
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl RemoteHost for MockHost {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn tree(
        &self,
        owner: &str,
        repo: &str,
        tree_ish: &str,
        recursive: bool,
    ) -> Result<Tree, RemoteError> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(owner, repo)?;

        let (git_ref, dir) = match tree_ish.strip_prefix("tree:") {
            Some(rest) => rest.split_once(':').unwrap_or((rest, "")),
            None => (tree_ish, ""),
        };
        let not_found = || RemoteError::not_found(format!("{owner}/{repo}:tree/{tree_ish}"));

        let files = self.files.read().unwrap();
        let refs = files
            .get(&(owner.to_owned(), repo.to_owned()))
            .ok_or_else(not_found)?;
        let paths = refs.get(git_ref).ok_or_else(not_found)?;

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let mut entries = Vec::new();
        let mut seen_dirs = HashSet::new();
        for path in paths.keys() {
            let Some(rel) = path.strip_prefix(&prefix) else {
                continue;
            };
            let segments: Vec<&str> = rel.split('/').collect();
            let dir_depth = if recursive { segments.len() - 1 } else { 1 };
            for depth in 1..=dir_depth.min(segments.len() - 1) {
                let dir_rel = segments[..depth].join("/");
                if seen_dirs.insert(dir_rel.clone()) {
                    entries.push(TreeEntry {
                        sha: format!("tree:{git_ref}:{prefix}{dir_rel}"),
                        path: dir_rel,
                        kind: EntryKind::Tree,
                    });
                }
            }
            if recursive || segments.len() == 1 {
                entries.push(TreeEntry {
                    path: rel.to_owned(),
                    kind: EntryKind::Blob,
                    sha: format!("blob:{git_ref}:{path}"),
                });
            }
        }

        if !dir.is_empty() && entries.is_empty() {
            return Err(not_found());
        }

        Ok(Tree {
            sha: tree_ish.to_owned(),
            tree: entries,
            truncated: false,
        })
    }

    async fn contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<EncodedContent, RemoteError> {
        self.contents_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(owner, repo)?;

        self.read_file(owner, repo, git_ref, path)
            .map(|content| EncodedContent::from_text(&content))
            .ok_or_else(|| RemoteError::not_found(format!("{owner}/{repo}:{git_ref}:{path}")))
    }

    async fn blob(&self, owner: &str, repo: &str, sha: &str) -> Result<EncodedContent, RemoteError> {
        self.blob_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(owner, repo)?;

        sha.strip_prefix("blob:")
            .and_then(|rest| rest.split_once(':'))
            .and_then(|(git_ref, path)| self.read_file(owner, repo, git_ref, path))
            .map(|content| EncodedContent::from_text(&content))
            .ok_or_else(|| RemoteError::not_found(format!("{owner}/{repo}:blob/{sha}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host() -> MockHost {
        MockHost::new()
            .with_file("acme", "widgets", "main", "README.md", "# Widgets")
            .with_file("acme", "widgets", "main", "docs/intro.md", "# Intro")
            .with_file("acme", "widgets", "main", "docs/guides/setup.md", "# Setup")
    }

    fn paths(tree: &Tree) -> Vec<(&str, EntryKind)> {
        tree.tree.iter().map(|e| (e.path.as_str(), e.kind)).collect()
    }

    #[tokio::test]
    async fn test_root_tree_lists_direct_children() {
        let tree = host().tree("acme", "widgets", "main", false).await.unwrap();

        assert_eq!(
            paths(&tree),
            vec![("README.md", EntryKind::Blob), ("docs", EntryKind::Tree)]
        );
        assert_eq!(tree.entry("docs").unwrap().sha, "tree:main:docs");
    }

    #[tokio::test]
    async fn test_recursive_subtree() {
        let tree = host()
            .tree("acme", "widgets", "tree:main:docs", true)
            .await
            .unwrap();

        assert_eq!(
            paths(&tree),
            vec![
                ("guides", EntryKind::Tree),
                ("guides/setup.md", EntryKind::Blob),
                ("intro.md", EntryKind::Blob),
            ]
        );
    }

    #[tokio::test]
    async fn test_blob_resolves_synthetic_sha() {
        let host = host();
        let tree = host
            .tree("acme", "widgets", "tree:main:docs", true)
            .await
            .unwrap();
        let sha = &tree.entry("intro.md").unwrap().sha;

        let blob = host.blob("acme", "widgets", sha).await.unwrap();

        assert_eq!(blob.decode().unwrap(), "# Intro");
        assert_eq!(host.blob_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = host()
            .contents("acme", "widgets", "CHANGELOG.md", "main")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let host = host().with_failure("acme", "widgets");
        let err = host
            .contents("acme", "widgets", "README.md", "main")
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_transient_failures_run_out() {
        let host = host().with_transient_failures(1);
        assert!(host.contents("acme", "widgets", "README.md", "main").await.is_err());
        assert!(host.contents("acme", "widgets", "README.md", "main").await.is_ok());
        assert_eq!(host.contents_calls(), 2);
    }
}
