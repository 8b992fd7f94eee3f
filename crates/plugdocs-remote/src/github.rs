//! GitHub REST API host.
//!
//! Uses a blocking ureq agent; every call runs on tokio's blocking pool so
//! callers only suspend their task.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::error::{RemoteError, RemoteErrorKind};
use crate::host::{EncodedContent, RemoteHost, Tree};

/// API version pinned for all requests.
const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = concat!("plugdocs/", env!("CARGO_PKG_VERSION"));

/// RFC 3986 unreserved characters: A-Z a-z 0-9 - . _ ~
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode each `/`-separated segment of a repository path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, UNRESERVED).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn tree_path(owner: &str, repo: &str, tree_ish: &str, recursive: bool) -> String {
    let mut path = format!(
        "/repos/{}/{}/git/trees/{}",
        encode_path(owner),
        encode_path(repo),
        encode_path(tree_ish)
    );
    if recursive {
        path.push_str("?recursive=1");
    }
    path
}

fn contents_path(owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
    format!(
        "/repos/{}/{}/contents/{}?ref={}",
        encode_path(owner),
        encode_path(repo),
        encode_path(path.trim_start_matches('/')),
        utf8_percent_encode(git_ref, UNRESERVED)
    )
}

/// GitHub (or GitHub Enterprise) REST API client.
pub struct GitHubHost {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubHost {
    /// Create a client for `api_url` with an optional bearer token.
    pub fn new(api_url: &str, token: Option<&str>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: token.filter(|t| !t.is_empty()).map(str::to_owned),
        }
    }

    async fn get_json<T>(&self, path: String) -> Result<T, RemoteError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = format!("{}{path}", self.api_url);
        let auth = self.token.as_ref().map(|t| format!("Bearer {t}"));

        tokio::task::spawn_blocking(move || request_json(&agent, &url, auth.as_deref()))
            .await
            .map_err(|e| {
                RemoteError::new(RemoteErrorKind::Other)
                    .with_resource(path)
                    .with_source(e)
            })?
    }
}

/// Perform a GET and decode the JSON body.
fn request_json<T: DeserializeOwned>(
    agent: &Agent,
    url: &str,
    auth: Option<&str>,
) -> Result<T, RemoteError> {
    tracing::debug!(url, "GitHub request");

    let mut request = agent
        .get(url)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", USER_AGENT)
        .header("X-GitHub-Api-Version", API_VERSION);
    if let Some(auth) = auth {
        request = request.header("Authorization", auth);
    }

    let response = request.call().map_err(|e| {
        RemoteError::new(RemoteErrorKind::Transport)
            .with_resource(url)
            .with_source(e)
    })?;

    let status = response.status().as_u16();
    let rate_limit_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(RemoteError::from_status(status, rate_limit_exhausted)
            .with_message(error_body)
            .with_resource(url));
    }

    body.read_json().map_err(|e| {
        RemoteError::new(RemoteErrorKind::InvalidResponse)
            .with_status(status)
            .with_resource(url)
            .with_source(e)
    })
}

#[async_trait]
impl RemoteHost for GitHubHost {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn tree(
        &self,
        owner: &str,
        repo: &str,
        tree_ish: &str,
        recursive: bool,
    ) -> Result<Tree, RemoteError> {
        self.get_json(tree_path(owner, repo, tree_ish, recursive))
            .await
    }

    async fn contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<EncodedContent, RemoteError> {
        self.get_json(contents_path(owner, repo, path, git_ref))
            .await
    }

    async fn blob(&self, owner: &str, repo: &str, sha: &str) -> Result<EncodedContent, RemoteError> {
        self.get_json(format!(
            "/repos/{}/{}/git/blobs/{}",
            encode_path(owner),
            encode_path(repo),
            encode_path(sha)
        ))
            .await
    }
}
