//! CLI interface for release-herald

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub mod deploy;
pub mod test_run;

/// release-herald: release digest notifications
#[derive(Parser)]
#[command(name = "release-herald")]
#[command(about = "Send release digest notifications to a webhook", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// Notify about a deployed commit range
    Deploy(deploy::DeployCommand),
    /// Notify about a test run report
    Test(test_run::TestRunCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Deploy(deploy_cmd) => deploy_cmd.execute().await,
            Commands::Test(test_cmd) => test_cmd.execute().await,
        }
    }
}

/// Resolves the webhook URL from the flag, the environment, or the settings
/// file, and validates it before any I/O happens.
pub(crate) fn resolve_webhook_url(arg: Option<String>) -> Result<String> {
    use crate::utils::settings::{resolve_url, WEBHOOK_URL_VAR};

    let url = resolve_url(arg, WEBHOOK_URL_VAR)?
        .with_context(|| format!("Webhook URL is required: pass --url or set {WEBHOOK_URL_VAR}"))?;

    url::Url::parse(&url).with_context(|| format!("Invalid webhook URL: {url}"))?;
    Ok(url)
}
