//! `plugdocs fetch` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use plugdocs_config::{CliSettings, Config};
use plugdocs_site::Site;

use crate::error::CliError;
use crate::output::Output;
use crate::site::build_site;

/// Arguments for the fetch command.
#[derive(Args)]
pub(crate) struct FetchArgs {
    /// Directory the page sources are written to.
    #[arg(short, long)]
    out: PathBuf,

    /// Path to configuration file (default: auto-discover plugdocs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitHub token (overrides config).
    #[arg(long, env = "PLUGDOCS_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Enable verbose output (fetch and aggregation logs).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Outcome of writing a listing to disk.
#[derive(Debug, Default)]
struct FetchSummary {
    written: usize,
    failed: Vec<(String, String)>,
}

impl FetchArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if self.out.is_file() {
            return Err(CliError::Validation(format!(
                "Output path is a file: {}",
                self.out.display()
            )));
        }

        let cli_settings = CliSettings {
            github_token: self.github_token,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let site = build_site(&config)?;

        output.heading(&format!(
            "Aggregating {} repositories",
            config.repositories.len()
        ));
        let pages = site.reload().await;
        output.field("Pages", pages);
        output.field("Output", self.out.display());

        let summary = write_pages(&site, &self.out).await?;
        for (path, error) in &summary.failed {
            output.warning(&format!("{path}: {error}"));
        }
        output.success(&format!(
            "Wrote {} pages to {}",
            summary.written,
            self.out.display()
        ));
        Ok(())
    }
}

/// Write the raw source of every listed page to `{out_dir}/{path}.md`.
///
/// A page that fails to load is recorded and skipped. I/O errors abort.
async fn write_pages(site: &Site, out_dir: &Path) -> Result<FetchSummary, CliError> {
    let listing = site.listing();
    let mut summary = FetchSummary::default();

    for record in listing.pages() {
        let source = match site.load_source(record).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(path = %record.path, error = %e, "Failed to load page source");
                summary.failed.push((record.path.clone(), e.to_string()));
                continue;
            }
        };

        let target = out_dir.join(format!("{}.md", record.path));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, source)?;
        tracing::info!(path = %target.display(), "Wrote page");
        summary.written += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use plugdocs_cache::MemoryCache;
    use plugdocs_remote::{MockHost, RateLimiter, RemoteFetcher, RetryPolicy};
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
[[repositories]]
repository_url = "https://github.com/acme/widgets"
docs_path = "docs"

[[repositories.versions]]
version = "2.x"
branch = "main"
limited_files = [{ name = "README.md", title = "Overview", slug = "overview" }]
"#;

    fn site() -> Site {
        let config = Config::from_toml(CONFIG).unwrap();
        let host = MockHost::new()
            .with_file("acme", "widgets", "main", "README.md", "# Widgets\n")
            .with_file("acme", "widgets", "main", "docs/guides/setup.md", "# Setup\n");
        let fetcher = RemoteFetcher::new(
            Arc::new(host),
            Arc::new(MemoryCache::new()),
            Arc::new(RateLimiter::new(
                100,
                Duration::from_secs(3600),
                Duration::from_secs(1),
            )),
        )
        .with_retry_policy(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(10),
        });
        Site::new(&config, Arc::new(fetcher)).unwrap()
    }

    #[tokio::test]
    async fn test_write_pages() {
        let site = site();
        site.reload().await;
        let dir = tempfile::tempdir().unwrap();

        let summary = write_pages(&site, dir.path()).await.unwrap();

        assert_eq!(summary.written, 2);
        assert!(summary.failed.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("widgets/2.x/overview.md")).unwrap(),
            "# Widgets\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("widgets/2.x/guides/setup.md")).unwrap(),
            "# Setup\n"
        );
    }

    #[tokio::test]
    async fn test_write_pages_empty_listing() {
        let site = site();
        let dir = tempfile::tempdir().unwrap();

        let summary = write_pages(&site, dir.path()).await.unwrap();

        assert_eq!(summary.written, 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
