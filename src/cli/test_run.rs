//! Test command — sends a test run digest built from a report file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use url::Url;

use crate::cli::resolve_webhook_url;
use crate::digest::{
    classify_coverage, export_reports, parse_report, ExportFormat, ExportOptions, ExportedReports,
    COVERAGE_THRESHOLD,
};
use crate::storage::{LocalStorage, Storage};
use crate::utils::settings::{resolve_url, STORAGE_URL_VAR};
use crate::webhook::{test_run_card, Transport, WebhookClient};

/// Test command options.
#[derive(Parser)]
pub struct TestRunCommand {
    /// Path to the test report JSON file.
    #[arg(long, default_value = "./TestResult.json")]
    pub path: PathBuf,

    /// Webhook endpoint URL (falls back to RELEASE_HERALD_WEBHOOK_URL).
    #[arg(long)]
    pub url: Option<String>,

    /// Directory report files are written to.
    #[arg(long, default_value = "./output")]
    pub output: PathBuf,

    /// Report file format.
    #[arg(long, default_value = "csv")]
    pub output_format: String,

    /// Report file field separator.
    #[arg(long, default_value = ";")]
    pub separator: String,

    /// Base URL the exported report files are served from
    /// (falls back to RELEASE_HERALD_STORAGE_URL).
    #[arg(long, alias = "host-url")]
    pub storage_url: Option<String>,

    /// Write report files and link them from the notification.
    #[arg(long)]
    pub export: bool,

    /// Minimum covered percentage bucketed as good.
    #[arg(long, default_value_t = COVERAGE_THRESHOLD)]
    pub threshold: u8,
}

impl TestRunCommand {
    /// Executes the test command.
    pub async fn execute(self) -> Result<()> {
        let url = resolve_webhook_url(self.url)?;
        let format: ExportFormat = self.output_format.parse()?;

        // Exported reports are linked from the card, so the base URL has to
        // resolve before anything is read or written
        let storage_url = if self.export {
            let raw = resolve_url(self.storage_url, STORAGE_URL_VAR)?.with_context(|| {
                format!("Storage URL is required when exporting: pass --storage-url or set {STORAGE_URL_VAR}")
            })?;
            Some(Url::parse(&raw).with_context(|| format!("Invalid storage URL: {raw}"))?)
        } else {
            None
        };

        let storage = LocalStorage;
        let bytes = storage.read(&self.path)?;
        let json = String::from_utf8(bytes).context("Test report is not valid UTF-8")?;
        let digest = parse_report(&json)
            .with_context(|| format!("Failed to parse test report: {}", self.path.display()))?;

        let partition = classify_coverage(digest.coverage.clone(), self.threshold);
        debug!(
            good = partition.good.len(),
            bad = partition.bad.len(),
            failures = digest.failures.len(),
            "classified test report"
        );

        let exported = if self.export {
            let options = ExportOptions {
                format,
                separator: self.separator.clone(),
                output_dir: self.output.clone(),
            };
            export_reports(&digest.failures, &partition, &options, &storage)?
        } else {
            ExportedReports::default()
        };

        let card = test_run_card(&digest.summary, &partition, &exported, storage_url.as_ref())?;
        WebhookClient::new().post(&url, &card).await?;

        Ok(())
    }
}
