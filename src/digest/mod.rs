//! Parsing, classification, and formatting pipeline for release digests.

pub mod commit_log;
pub mod coverage;
pub mod duration;
pub mod export;
pub mod report;

pub use commit_log::{group_items, parse_commit_log, Item, ItemKind, DEFAULT_LOG_PATTERN};
pub use coverage::{classify_coverage, CoverageEntry, CoveragePartition, COVERAGE_THRESHOLD};
pub use duration::format_duration;
pub use export::{export_reports, ExportFormat, ExportOptions, ExportedReports};
pub use report::{parse_report, ReportDigest, ReportError, RunOutcome, TestFailure, TestSummary};
