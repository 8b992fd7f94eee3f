//! Remote repository host abstraction.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteErrorKind};

/// Directory listing at a tree sha or ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Sha of this tree.
    pub sha: String,
    /// Entries; nested paths appear when listed recursively.
    pub tree: Vec<TreeEntry>,
    /// Set when the host cut a recursive listing short.
    #[serde(default)]
    pub truncated: bool,
}

impl Tree {
    /// Find a direct child by name.
    pub fn entry(&self, path: &str) -> Option<&TreeEntry> {
        self.tree.iter().find(|e| e.path == path)
    }
}

/// One entry of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the listed tree.
    pub path: String,
    /// Entry type.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Content address.
    pub sha: String,
}

/// Tree entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// File.
    Blob,
    /// Directory.
    Tree,
    /// Submodule.
    Commit,
    #[serde(other)]
    Other,
}

/// Content payload as returned by the contents and blob APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedContent {
    /// Encoded content, possibly wrapped across lines.
    #[serde(default)]
    pub content: String,
    /// `base64` or `utf-8`.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    "base64".to_owned()
}

impl EncodedContent {
    /// Wrap UTF-8 text as base64 content.
    pub fn from_text(text: &str) -> Self {
        Self {
            content: STANDARD.encode(text),
            encoding: default_encoding(),
        }
    }

    /// Decode into UTF-8 text.
    pub fn decode(&self) -> Result<String, RemoteError> {
        if self.encoding != "base64" {
            return Ok(self.content.clone());
        }
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD.decode(compact).map_err(|e| {
            RemoteError::new(RemoteErrorKind::InvalidResponse).with_source(e)
        })?;
        String::from_utf8(bytes)
            .map_err(|e| RemoteError::new(RemoteErrorKind::InvalidResponse).with_source(e))
    }
}

/// Read-only access to a repository host's tree and content APIs.
///
/// Implementations return [`RemoteErrorKind::NotFound`] for missing
/// resources; classification into absence happens in the fetcher.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Short backend name for logs (e.g. "GitHub", "Mock").
    fn name(&self) -> &'static str;

    /// Whether requests carry a credential.
    fn is_authenticated(&self) -> bool;

    /// List a tree by ref or sha.
    async fn tree(
        &self,
        owner: &str,
        repo: &str,
        tree_ish: &str,
        recursive: bool,
    ) -> Result<Tree, RemoteError>;

    /// Fetch a file by path at a ref.
    async fn contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<EncodedContent, RemoteError>;

    /// Fetch a blob by sha.
    async fn blob(&self, owner: &str, repo: &str, sha: &str) -> Result<EncodedContent, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_base64() {
        let content = EncodedContent {
            content: "IyBIZWxs\nbw==\n".to_owned(),
            encoding: "base64".to_owned(),
        };
        assert_eq!(content.decode().unwrap(), "# Hello");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let content = EncodedContent {
            content: "!!!".to_owned(),
            encoding: "base64".to_owned(),
        };
        assert_eq!(
            content.decode().unwrap_err().kind,
            RemoteErrorKind::InvalidResponse
        );
    }

    #[test]
    fn test_from_text_roundtrip() {
        let content = EncodedContent::from_text("héllo");
        assert_eq!(content.decode().unwrap(), "héllo");
    }

    #[test]
    fn test_tree_deserializes_github_shape() {
        let json = r#"{
            "sha": "abc",
            "url": "https://api.github.com/repos/o/r/git/trees/abc",
            "tree": [
                {"path": "docs", "mode": "040000", "type": "tree", "sha": "d1"},
                {"path": "README.md", "mode": "100644", "type": "blob", "sha": "b1", "size": 12},
                {"path": "vendor", "mode": "160000", "type": "commit", "sha": "c1"}
            ],
            "truncated": false
        }"#;
        let tree: Tree = serde_json::from_str(json).unwrap();

        assert_eq!(tree.tree.len(), 3);
        assert_eq!(tree.entry("docs").unwrap().kind, EntryKind::Tree);
        assert_eq!(tree.entry("vendor").unwrap().kind, EntryKind::Commit);
    }
}
