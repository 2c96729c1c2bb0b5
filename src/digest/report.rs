//! Test report parsing and normalization.
//!
//! Two report shapes are accepted. The legacy shape carries a pre-aggregated
//! `summary` block together with pre-computed per-class coverage percentages
//! and a populated `failures` array. The raw shape carries per-class location
//! counts and individual test records; the summary is derived from them here.
//! Both shapes normalize into the same [`ReportDigest`].

use std::collections::HashMap;

use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::digest::coverage::CoverageEntry;

/// Errors raised while parsing a test report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The report document is not valid JSON or misses required fields.
    #[error("Malformed test report: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A timestamp field could not be parsed.
    #[error("Invalid timestamp in test report: {0}")]
    InvalidTimestamp(String),
}

/// Overall outcome of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every test passed.
    Passed,
    /// At least one test failed or failed to compile.
    Failed,
}

impl RunOutcome {
    /// Display label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            RunOutcome::Passed => "Passed",
            RunOutcome::Failed => "Failed",
        }
    }
}

/// Normalized run-level statistics.
#[derive(Debug, Clone)]
pub struct TestSummary {
    /// Identifier of the test run.
    pub run_id: String,
    /// Overall run outcome.
    pub outcome: RunOutcome,
    /// Start timestamp, verbatim from the report.
    pub start_time: String,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Coverage percentage across the classes exercised by this run.
    pub run_coverage_percent: u8,
    /// Coverage percentage across the whole org.
    pub org_wide_coverage_percent: u8,
    /// Number of tests executed.
    pub tests_ran: u32,
    /// Number of passing tests.
    pub passing: u32,
    /// Passing rate rendered as `"NN%"`.
    pub pass_rate: String,
    /// Number of failing tests.
    pub failing: u32,
    /// Failing rate rendered as `"NN%"`.
    pub fail_rate: String,
}

/// One failing test with optional class coverage decoration.
#[derive(Debug, Clone)]
pub struct TestFailure {
    /// Fully qualified test name (`Class.method`).
    pub full_name: String,
    /// Failure message.
    pub message: String,
    /// Stack trace, possibly spanning multiple lines.
    pub stack_trace: String,
    /// Coverage of the owning class, when a matching entry exists.
    pub covered_percent: Option<u8>,
}

/// Normalized result of parsing one report document.
#[derive(Debug, Clone)]
pub struct ReportDigest {
    /// Run-level statistics.
    pub summary: TestSummary,
    /// Per-class coverage entries, sorted by name.
    pub coverage: Vec<CoverageEntry>,
    /// Failing tests, sorted by full name.
    pub failures: Vec<TestFailure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyReport {
    summary: LegacySummary,
    #[serde(default)]
    failures: Vec<LegacyFailure>,
    #[serde(default)]
    coverage: Vec<LegacyCoverage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySummary {
    test_run_id: String,
    outcome: String,
    test_start_time: String,
    /// Millisecond count with a unit suffix, e.g. "4403 ms".
    test_execution_time: String,
    test_run_coverage: String,
    org_wide_coverage: String,
    tests_ran: u32,
    passing: u32,
    failing: u32,
    pass_rate: String,
    fail_rate: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFailure {
    name: String,
    method_name: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    stack_trace: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCoverage {
    name: String,
    covered_percent: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    test_run_id: String,
    created_date: String,
    completed_date: String,
    #[serde(default)]
    org_wide_coverage: u8,
    #[serde(default)]
    tests: Vec<RawTest>,
    #[serde(default)]
    coverage: Vec<RawCoverage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTest {
    full_name: String,
    outcome: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack_trace: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoverage {
    name: String,
    num_locations: u64,
    num_locations_not_covered: u64,
}

/// Parses a test report document into a normalized digest.
///
/// A top-level `summary` object selects the legacy shape; anything else is
/// treated as the raw shape. Coverage entries and failures come back sorted
/// ascending by name (ordinal comparison).
pub fn parse_report(json: &str) -> Result<ReportDigest, ReportError> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    let mut digest = if value.get("summary").is_some() {
        normalize_legacy(serde_json::from_value(value)?)
    } else {
        normalize_raw(serde_json::from_value(value)?)?
    };

    digest.coverage.sort_by(|a, b| a.name.cmp(&b.name));
    digest.failures.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    tracing::debug!(
        coverage = digest.coverage.len(),
        failures = digest.failures.len(),
        "normalized test report"
    );
    Ok(digest)
}

fn normalize_legacy(report: LegacyReport) -> ReportDigest {
    let summary = &report.summary;

    let coverage: Vec<CoverageEntry> = report
        .coverage
        .into_iter()
        .map(|c| CoverageEntry {
            name: c.name,
            covered_percent: c.covered_percent,
        })
        .collect();
    let lookup = coverage_lookup(&coverage);

    let failures = report
        .failures
        .into_iter()
        .map(|f| TestFailure {
            covered_percent: lookup.get(&f.name).copied(),
            full_name: format!("{}.{}", f.name, f.method_name),
            message: f.message,
            stack_trace: f.stack_trace,
        })
        .collect();

    let outcome = if summary.outcome == "Passed" {
        RunOutcome::Passed
    } else {
        RunOutcome::Failed
    };

    ReportDigest {
        summary: TestSummary {
            run_id: summary.test_run_id.clone(),
            outcome,
            start_time: summary.test_start_time.clone(),
            execution_time_ms: parse_leading_ms(&summary.test_execution_time),
            run_coverage_percent: parse_percent(&summary.test_run_coverage),
            org_wide_coverage_percent: parse_percent(&summary.org_wide_coverage),
            tests_ran: summary.tests_ran,
            passing: summary.passing,
            pass_rate: summary.pass_rate.clone(),
            failing: summary.failing,
            fail_rate: summary.fail_rate.clone(),
        },
        coverage,
        failures,
    }
}

fn normalize_raw(report: RawReport) -> Result<ReportDigest, ReportError> {
    let created = parse_timestamp(&report.created_date)?;
    let completed = parse_timestamp(&report.completed_date)?;
    let execution_time_ms = (completed - created).num_milliseconds().max(0) as u64;

    let mut total_locations = 0u64;
    let mut not_covered_locations = 0u64;
    let coverage: Vec<CoverageEntry> = report
        .coverage
        .into_iter()
        .map(|c| {
            total_locations += c.num_locations;
            not_covered_locations += c.num_locations_not_covered;
            CoverageEntry {
                name: c.name,
                covered_percent: percent_covered(c.num_locations, c.num_locations_not_covered),
            }
        })
        .collect();
    let lookup = coverage_lookup(&coverage);

    let tests_ran = report.tests.len() as u32;
    let passing = report.tests.iter().filter(|t| t.outcome == "Pass").count() as u32;

    let failures: Vec<TestFailure> = report
        .tests
        .into_iter()
        .filter(|t| t.outcome == "Fail" || t.outcome == "CompileFail")
        .map(|t| {
            let class_name = t.full_name.split('.').next().unwrap_or("");
            TestFailure {
                covered_percent: lookup.get(class_name).copied(),
                full_name: t.full_name,
                message: t.message.unwrap_or_default(),
                stack_trace: t.stack_trace.unwrap_or_default(),
            }
        })
        .collect();

    let failing = failures.len() as u32;
    let outcome = if failing == 0 {
        RunOutcome::Passed
    } else {
        RunOutcome::Failed
    };

    Ok(ReportDigest {
        summary: TestSummary {
            run_id: report.test_run_id,
            outcome,
            start_time: report.created_date,
            execution_time_ms,
            run_coverage_percent: percent_covered(total_locations, not_covered_locations),
            org_wide_coverage_percent: report.org_wide_coverage,
            tests_ran,
            passing,
            pass_rate: rate(passing, tests_ran),
            failing,
            fail_rate: rate(failing, tests_ran),
        },
        coverage,
        failures,
    })
}

/// Name-to-percent lookup; a duplicated class name keeps the last entry.
fn coverage_lookup(entries: &[CoverageEntry]) -> HashMap<String, u8> {
    entries
        .iter()
        .map(|e| (e.name.clone(), e.covered_percent))
        .collect()
}

fn parse_timestamp(text: &str) -> Result<DateTime<chrono::FixedOffset>, ReportError> {
    DateTime::parse_from_rfc3339(text).map_err(|_| ReportError::InvalidTimestamp(text.to_string()))
}

fn percent_covered(total: u64, not_covered: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let covered = total.saturating_sub(not_covered);
    ((covered as f64 / total as f64) * 100.0).round() as u8
}

fn rate(part: u32, total: u32) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{}%", ((part as f64 / total as f64) * 100.0).round() as u32)
}

fn parse_percent(text: &str) -> u8 {
    text.trim().trim_end_matches('%').trim().parse().unwrap_or(0)
}

fn parse_leading_ms(text: &str) -> u64 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_REPORT: &str = r#"{
        "summary": {
            "testRunId": "707wx0000AGQ3jbQQD",
            "outcome": "Failed",
            "testStartTime": "2024-06-01T10:00:00.000Z",
            "testExecutionTime": "4403 ms",
            "testRunCoverage": "86%",
            "orgWideCoverage": "72%",
            "testsRan": 30,
            "passing": 28,
            "failing": 2,
            "passRate": "93%",
            "failRate": "7%"
        },
        "failures": [
            {
                "name": "OrderServiceTest",
                "methodName": "rejectsEmptyCart",
                "message": "Assertion failed",
                "stackTrace": "Class.OrderServiceTest.rejectsEmptyCart: line 42"
            }
        ],
        "coverage": [
            { "name": "OrderServiceTest", "coveredPercent": 91 },
            { "name": "AccountService", "coveredPercent": 64 }
        ]
    }"#;

    const RAW_REPORT: &str = r#"{
        "testRunId": "707wx0000AGQ3jcQQD",
        "createdDate": "2024-06-01T10:00:00Z",
        "completedDate": "2024-06-01T10:01:01Z",
        "orgWideCoverage": 72,
        "tests": [
            { "fullName": "BillingTest.chargesOnce", "outcome": "Pass" },
            {
                "fullName": "BillingTest.refundsTwice",
                "outcome": "Fail",
                "message": "System.AssertException",
                "stackTrace": "Class.BillingTest.refundsTwice: line 7\nexternal entry point"
            },
            { "fullName": "Broken.compile", "outcome": "CompileFail", "message": "Missing semicolon" }
        ],
        "coverage": [
            { "name": "Billing", "numLocations": 100, "numLocationsNotCovered": 25 },
            { "name": "Account", "numLocations": 50, "numLocationsNotCovered": 2 }
        ]
    }"#;

    #[test]
    fn legacy_summary_extraction() {
        let digest = parse_report(LEGACY_REPORT).unwrap();
        let summary = &digest.summary;

        assert_eq!(summary.run_id, "707wx0000AGQ3jbQQD");
        assert_eq!(summary.outcome, RunOutcome::Failed);
        assert_eq!(summary.execution_time_ms, 4403);
        assert_eq!(summary.run_coverage_percent, 86);
        assert_eq!(summary.org_wide_coverage_percent, 72);
        assert_eq!(summary.tests_ran, 30);
        assert_eq!(summary.pass_rate, "93%");
        assert_eq!(summary.fail_rate, "7%");
    }

    #[test]
    fn legacy_failures_carry_class_coverage() {
        let digest = parse_report(LEGACY_REPORT).unwrap();

        assert_eq!(digest.failures.len(), 1);
        let failure = &digest.failures[0];
        assert_eq!(failure.full_name, "OrderServiceTest.rejectsEmptyCart");
        assert_eq!(failure.covered_percent, Some(91));
    }

    #[test]
    fn legacy_coverage_is_sorted_by_name() {
        let digest = parse_report(LEGACY_REPORT).unwrap();
        let names: Vec<&str> = digest.coverage.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, ["AccountService", "OrderServiceTest"]);
    }

    #[test]
    fn raw_summary_is_derived() {
        let digest = parse_report(RAW_REPORT).unwrap();
        let summary = &digest.summary;

        assert_eq!(summary.outcome, RunOutcome::Failed);
        assert_eq!(summary.execution_time_ms, 61_000);
        assert_eq!(summary.start_time, "2024-06-01T10:00:00Z");
        // (100 - 25) + (50 - 2) locations covered out of 150
        assert_eq!(summary.run_coverage_percent, 82);
        assert_eq!(summary.org_wide_coverage_percent, 72);
        assert_eq!(summary.tests_ran, 3);
        assert_eq!(summary.passing, 1);
        assert_eq!(summary.failing, 2);
        assert_eq!(summary.pass_rate, "33%");
        assert_eq!(summary.fail_rate, "67%");
    }

    #[test]
    fn raw_per_class_percentages() {
        let digest = parse_report(RAW_REPORT).unwrap();

        let billing = digest.coverage.iter().find(|c| c.name == "Billing").unwrap();
        assert_eq!(billing.covered_percent, 75);
        let account = digest.coverage.iter().find(|c| c.name == "Account").unwrap();
        assert_eq!(account.covered_percent, 96);
    }

    #[test]
    fn raw_failures_include_compile_failures() {
        let digest = parse_report(RAW_REPORT).unwrap();
        let names: Vec<&str> = digest.failures.iter().map(|f| f.full_name.as_str()).collect();

        assert_eq!(names, ["BillingTest.refundsTwice", "Broken.compile"]);
    }

    #[test]
    fn raw_failure_coverage_matches_class_name() {
        let digest = parse_report(RAW_REPORT).unwrap();

        let refunds = digest
            .failures
            .iter()
            .find(|f| f.full_name == "BillingTest.refundsTwice")
            .unwrap();
        // No coverage entry is named BillingTest, only Billing
        assert_eq!(refunds.covered_percent, None);
    }

    #[test]
    fn raw_zero_locations_covers_nothing() {
        let report = r#"{
            "testRunId": "r",
            "createdDate": "2024-06-01T10:00:00Z",
            "completedDate": "2024-06-01T10:00:00Z",
            "coverage": [ { "name": "Empty", "numLocations": 0, "numLocationsNotCovered": 0 } ]
        }"#;
        let digest = parse_report(report).unwrap();

        assert_eq!(digest.coverage[0].covered_percent, 0);
        assert_eq!(digest.summary.run_coverage_percent, 0);
        assert_eq!(digest.summary.pass_rate, "0%");
        assert_eq!(digest.summary.outcome, RunOutcome::Passed);
        assert_eq!(digest.summary.execution_time_ms, 0);
    }

    #[test]
    fn sorting_is_ordinal_ascending() {
        let report = r#"{
            "testRunId": "r",
            "createdDate": "2024-06-01T10:00:00Z",
            "completedDate": "2024-06-01T10:00:05Z",
            "coverage": [
                { "name": "B", "numLocations": 10, "numLocationsNotCovered": 0 },
                { "name": "A", "numLocations": 10, "numLocationsNotCovered": 0 },
                { "name": "C", "numLocations": 10, "numLocationsNotCovered": 0 }
            ]
        }"#;
        let digest = parse_report(report).unwrap();
        let names: Vec<&str> = digest.coverage.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_report("not json"),
            Err(ReportError::Malformed(_))
        ));
    }

    #[test]
    fn missing_required_fields_is_an_error() {
        assert!(parse_report(r#"{ "tests": [] }"#).is_err());
    }

    #[test]
    fn invalid_timestamp_is_an_error() {
        let report = r#"{
            "testRunId": "r",
            "createdDate": "yesterday",
            "completedDate": "2024-06-01T10:00:00Z"
        }"#;
        assert!(matches!(
            parse_report(report),
            Err(ReportError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn duplicate_coverage_names_keep_last_in_lookup() {
        let report = r#"{
            "summary": {
                "testRunId": "r", "outcome": "Failed",
                "testStartTime": "2024-06-01T10:00:00.000Z",
                "testExecutionTime": "10 ms",
                "testRunCoverage": "50%", "orgWideCoverage": "50%",
                "testsRan": 1, "passing": 0, "failing": 1,
                "passRate": "0%", "failRate": "100%"
            },
            "failures": [ { "name": "Dup", "methodName": "m" } ],
            "coverage": [
                { "name": "Dup", "coveredPercent": 10 },
                { "name": "Dup", "coveredPercent": 20 }
            ]
        }"#;
        let digest = parse_report(report).unwrap();

        // Both rows are kept for export; the failure decoration sees the last
        assert_eq!(digest.coverage.len(), 2);
        assert_eq!(digest.failures[0].covered_percent, Some(20));
    }
}
