//! Deploy command — sends a deployment digest built from a commit range.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::cli::resolve_webhook_url;
use crate::digest::parse_commit_log;
use crate::git::GitRepository;
use crate::storage::{LocalStorage, Storage};
use crate::webhook::{deployment_card, Transport, WebhookClient};

/// Deploy command options.
#[derive(Parser)]
pub struct DeployCommand {
    /// Webhook endpoint URL (falls back to RELEASE_HERALD_WEBHOOK_URL).
    #[arg(long)]
    pub url: Option<String>,

    /// Environment label shown in the notification.
    #[arg(long, default_value = "current environment")]
    pub env: String,

    /// Branch label shown in the notification.
    #[arg(long, default_value = "Current branch")]
    pub branch: String,

    /// Start of the commit range (exclusive).
    #[arg(long)]
    pub from: Option<String>,

    /// End of the commit range.
    #[arg(long, default_value = "HEAD")]
    pub to: String,

    /// Match the log pattern case-sensitively.
    #[arg(long)]
    pub case_sensitive: bool,

    /// Override the log line pattern.
    #[arg(long)]
    pub regex: Option<String>,

    /// Read log text from a file instead of the local repository.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl DeployCommand {
    /// Executes the deploy command.
    pub async fn execute(self) -> Result<()> {
        let url = resolve_webhook_url(self.url)?;

        let log_text = match &self.log_file {
            Some(path) => {
                let bytes = LocalStorage.read(path)?;
                String::from_utf8(bytes).context("Commit log is not valid UTF-8")?
            }
            None => {
                let repo = GitRepository::open()?;
                repo.log_text(self.from.as_deref(), &self.to)?
            }
        };

        let items = parse_commit_log(&log_text, self.regex.as_deref(), self.case_sensitive)?;
        debug!(count = items.len(), "building deployment card");

        let card = deployment_card(&self.branch, &self.env, &items);
        WebhookClient::new().post(&url, &card).await?;

        Ok(())
    }
}
