//! Delimited report file export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::digest::coverage::{CoverageEntry, CoveragePartition};
use crate::digest::report::TestFailure;
use crate::storage::Storage;

/// Supported report file renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Delimited text, one quoted field per column.
    Csv,
    /// Recognized but not implemented; exporting in this format writes nothing.
    Html,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            other => anyhow::bail!("Unsupported output format: {other}"),
        }
    }
}

/// Report export configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// File rendering.
    pub format: ExportFormat,
    /// Field separator placed between quoted fields.
    pub separator: String,
    /// Directory the report files are written to.
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            separator: ";".to_string(),
            output_dir: PathBuf::from("./output"),
        }
    }
}

/// Paths of the report files written by one export call.
#[derive(Debug, Default, Clone)]
pub struct ExportedReports {
    /// Failing tests report, when written.
    pub failed_tests: Option<PathBuf>,
    /// Good coverage report, when written.
    pub good_coverage: Option<PathBuf>,
    /// Bad coverage report, when written.
    pub bad_coverage: Option<PathBuf>,
}

impl ExportedReports {
    /// True when no report file was written.
    pub fn is_empty(&self) -> bool {
        self.failed_tests.is_none() && self.good_coverage.is_none() && self.bad_coverage.is_none()
    }
}

/// Writes the failing-test and coverage reports through `storage`.
///
/// Every field is double-quote wrapped; embedded newlines are retained
/// verbatim inside the quoted field and embedded quotes are written as-is,
/// which keeps the on-disk format byte-compatible with existing consumers.
/// A write failure mid-sequence aborts and leaves earlier files in place.
pub fn export_reports(
    failures: &[TestFailure],
    partition: &CoveragePartition,
    options: &ExportOptions,
    storage: &dyn Storage,
) -> Result<ExportedReports> {
    match options.format {
        ExportFormat::Csv => export_delimited(failures, partition, options, storage),
        ExportFormat::Html => {
            warn!("html report export is not implemented; no files written");
            Ok(ExportedReports::default())
        }
    }
}

fn export_delimited(
    failures: &[TestFailure],
    partition: &CoveragePartition,
    options: &ExportOptions,
    storage: &dyn Storage,
) -> Result<ExportedReports> {
    let separator = options.separator.as_str();
    let extension = options.format.extension();

    let failed_tests = options.output_dir.join(format!("failedTest.{extension}"));
    let mut rows = vec![quote_row(
        &["Test name", "Message", "Stack trace", "Coverage (%)"],
        separator,
    )];
    for failure in failures {
        let coverage = failure
            .covered_percent
            .map(|p| p.to_string())
            .unwrap_or_default();
        rows.push(quote_row(
            &[
                failure.full_name.as_str(),
                failure.message.as_str(),
                failure.stack_trace.as_str(),
                coverage.as_str(),
            ],
            separator,
        ));
    }
    write_rows(storage, &failed_tests, &rows)?;

    let good_coverage = options.output_dir.join(format!("goodCoverage.{extension}"));
    write_rows(
        storage,
        &good_coverage,
        &coverage_rows(&partition.good, separator),
    )?;

    let bad_coverage = options.output_dir.join(format!("badCoverage.{extension}"));
    write_rows(
        storage,
        &bad_coverage,
        &coverage_rows(&partition.bad, separator),
    )?;

    debug!(dir = %options.output_dir.display(), "report files written");
    Ok(ExportedReports {
        failed_tests: Some(failed_tests),
        good_coverage: Some(good_coverage),
        bad_coverage: Some(bad_coverage),
    })
}

fn coverage_rows(entries: &[CoverageEntry], separator: &str) -> Vec<String> {
    let mut rows = vec![quote_row(&["Class name", "Coverage (%)"], separator)];
    for entry in entries {
        let percent = entry.covered_percent.to_string();
        rows.push(quote_row(&[entry.name.as_str(), percent.as_str()], separator));
    }
    rows
}

fn write_rows(storage: &dyn Storage, path: &std::path::Path, rows: &[String]) -> Result<()> {
    let mut text = rows.join("\n");
    text.push('\n');
    storage
        .write(path, text.as_bytes())
        .with_context(|| format!("Failed to export report: {}", path.display()))
}

fn quote_row(fields: &[&str], separator: &str) -> String {
    fields
        .iter()
        .map(|field| format!("\"{field}\""))
        .collect::<Vec<_>>()
        .join(separator)
}
