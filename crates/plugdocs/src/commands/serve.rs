//! `plugdocs serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use plugdocs_config::{CliSettings, Config};
use plugdocs_server::{ServerConfig, run_server};

use crate::error::CliError;
use crate::output::Output;
use crate::site::build_site;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover plugdocs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// GitHub token (overrides config).
    #[arg(long, env = "PLUGDOCS_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Enable verbose output (fetch and aggregation logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            github_token: self.github_token,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if config.repositories.is_empty() {
            output.warning("No repositories configured");
        }

        output.heading(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.field("Repositories", config.repositories.len());
        output.field("Base URL", &config.site.base_url);
        output.field(
            "GitHub token",
            if config.github.token().is_some() { "set" } else { "not set" },
        );
        match config.aggregation.refresh_interval() {
            Some(interval) => output.field("Listing refresh", format!("every {}s", interval.as_secs())),
            None => output.field("Listing refresh", "disabled"),
        }

        let site = build_site(&config)?;
        let server_config = ServerConfig::from_config(&config, version.to_owned());
        run_server(server_config, site)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
