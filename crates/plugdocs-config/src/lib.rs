//! Configuration management for plugdocs.
//!
//! Parses `plugdocs.toml` with serde, resolves the repository list into
//! validated [`RepositoryConfig`]s and provides auto-discovery of the config
//! file in parent directories. The file is read once at startup.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `github.token`
//! - `github.api_url`
//! - `github.web_url`

mod expand;
mod naming;
mod repository;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub use naming::{base_file_name, display_name_from_repo, file_slug, slugify_words, title_from_file};
pub use repository::{LimitedFile, RepositoryConfig, VersionConfig};

use repository::RepositoryRaw;

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the remote host token.
    pub github_token: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "plugdocs.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Site routing configuration.
    pub site: SiteConfig,
    /// Remote host access.
    pub github: GitHubConfig,
    /// Memory cache configuration.
    pub cache: CacheConfig,
    /// Outbound rate limit.
    pub rate_limit: RateLimitConfig,
    /// Retry policy for remote calls.
    pub retry: RetryConfig,
    /// Aggregation pass tuning.
    pub aggregation: AggregationConfig,
    #[serde(rename = "repositories")]
    repositories_raw: Vec<RepositoryRaw>,

    /// Resolved repositories (set after loading).
    #[serde(skip)]
    pub repositories: Vec<RepositoryConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfig::default(),
            github: GitHubConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            aggregation: AggregationConfig::default(),
            repositories_raw: Vec::new(),
            repositories: Vec::new(),
            config_path: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Site routing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL prefix for page routes, e.g. `/docs`.
    pub base_url: String,
    /// Root title of the navigation tree.
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "/docs".to_owned(),
            title: "Plugin Documentation".to_owned(),
        }
    }
}

/// Remote host (GitHub) access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Bearer token. Empty means anonymous access.
    pub token: String,
    /// REST API base URL.
    pub api_url: String,
    /// Web base URL used for blob fallback links.
    pub web_url: String,
    /// Refuse to start the remote source without a token.
    pub require_token: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: "${GITHUB_TOKEN:-}".to_owned(),
            api_url: "https://api.github.com".to_owned(),
            web_url: "https://github.com".to_owned(),
            require_token: false,
            timeout_secs: 30,
        }
    }
}

impl GitHubConfig {
    /// Token if one is configured.
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Memory cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for fetched content, in seconds.
    pub ttl_secs: u64,
    /// Interval of the expired-entry sweep, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 7200,
            cleanup_interval_secs: 600,
        }
    }
}

impl CacheConfig {
    /// Entry time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Sliding-window rate limit for outbound API calls.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: usize,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Delay between slot checks while waiting, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 50,
            window_secs: 3600,
            poll_interval_secs: 5,
        }
    }
}

impl RateLimitConfig {
    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Exponential backoff settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds. Doubles per attempt.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Aggregation pass tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Repository/version pairs fetched at once.
    pub concurrency: usize,
    /// Re-aggregate periodically while serving, in seconds. Off when unset.
    pub refresh_interval_secs: Option<u64>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            refresh_interval_secs: None,
        }
    }
}

impl AggregationConfig {
    /// Refresh interval, if enabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`github.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a numeric field to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `plugdocs.toml` in current directory and parents,
    /// and falls back to defaults (no repositories) when none is found.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            let mut config = Self::default();
            config.expand_env_vars()?;
            config
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse and resolve configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_repositories()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(token) = &settings.github_token {
            self.github.token.clone_from(token);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Find a repository by repo slug or display slug.
    pub fn repository_by_slug(&self, slug: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.matches_slug(slug))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_github()?;
        self.validate_tuning()?;
        self.validate_repositories()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if !self.site.base_url.starts_with('/') {
            return Err(ConfigError::Validation(
                "site.base_url must start with /".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_github(&self) -> Result<(), ConfigError> {
        require_http_url(&self.github.api_url, "github.api_url")?;
        require_http_url(&self.github.web_url, "github.web_url")?;
        require_positive(self.github.timeout_secs, "github.timeout_secs")?;
        Ok(())
    }

    fn validate_tuning(&self) -> Result<(), ConfigError> {
        require_positive(self.cache.ttl_secs, "cache.ttl_secs")?;
        require_positive(
            self.cache.cleanup_interval_secs,
            "cache.cleanup_interval_secs",
        )?;
        require_positive(self.rate_limit.max_requests as u64, "rate_limit.max_requests")?;
        require_positive(self.rate_limit.window_secs, "rate_limit.window_secs")?;
        require_positive(
            self.rate_limit.poll_interval_secs,
            "rate_limit.poll_interval_secs",
        )?;
        require_positive(self.aggregation.concurrency as u64, "aggregation.concurrency")?;
        if let Some(secs) = self.aggregation.refresh_interval_secs {
            require_positive(secs, "aggregation.refresh_interval_secs")?;
        }
        Ok(())
    }

    /// Repository and version slugs are routing keys and must be unique.
    fn validate_repositories(&self) -> Result<(), ConfigError> {
        let mut slugs = HashSet::new();
        for repo in &self.repositories {
            let name = repo.full_name();
            if !slugs.insert(repo.repo.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate repository slug: {}",
                    repo.repo
                )));
            }
            let display_slug = repo.display_slug();
            if display_slug != repo.repo && !slugs.insert(display_slug.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate repository display slug: {display_slug} ({name})"
                )));
            }
            if repo.versions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "repository {name} must declare at least one version"
                )));
            }

            let mut labels = HashSet::new();
            for version in &repo.versions {
                require_non_empty(&version.version, &format!("{name}.versions.version"))?;
                require_non_empty(&version.branch, &format!("{name}.versions.branch"))?;
                if !labels.insert(version.version.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate version {} in repository {name}",
                        version.version
                    )));
                }
                let mut file_slugs = HashSet::new();
                for file in &version.limited_files {
                    require_non_empty(&file.name, &format!("{name}.limited_files.name"))?;
                    if !file_slugs.insert(file.slug.as_str()) {
                        return Err(ConfigError::Validation(format!(
                            "duplicate file slug {} in {name} {}",
                            file.slug, version.version
                        )));
                    }
                }
            }
            if let Some(latest) = &repo.latest_version
                && repo.version(latest).is_none()
            {
                return Err(ConfigError::Validation(format!(
                    "latest_version {latest} of {name} is not a configured version"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.github.token = expand::expand_env(&self.github.token, "github.token")?;
        self.github.api_url = expand::expand_env(&self.github.api_url, "github.api_url")?;
        self.github.web_url = expand::expand_env(&self.github.web_url, "github.web_url")?;
        Ok(())
    }

    fn resolve_repositories(&mut self) -> Result<(), ConfigError> {
        let web_url = self.github.web_url.clone();
        self.repositories = std::mem::take(&mut self.repositories_raw)
            .into_iter()
            .map(|raw| raw.resolve(&web_url))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}
