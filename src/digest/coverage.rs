//! Coverage entry bucketing by threshold.

/// Default minimum covered percentage bucketed as good.
pub const COVERAGE_THRESHOLD: u8 = 85;

/// Per-class test coverage percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageEntry {
    /// Class name.
    pub name: String,
    /// Covered percentage, 0..=100.
    pub covered_percent: u8,
}

/// Disjoint partition of coverage entries around a threshold.
#[derive(Debug, Default, Clone)]
pub struct CoveragePartition {
    /// Entries at or above the threshold.
    pub good: Vec<CoverageEntry>,
    /// Entries below the threshold.
    pub bad: Vec<CoverageEntry>,
}

/// Partitions entries by `covered_percent >= threshold`, keeping input order
/// within each bucket.
pub fn classify_coverage(entries: Vec<CoverageEntry>, threshold: u8) -> CoveragePartition {
    let (good, bad) = entries
        .into_iter()
        .partition(|entry| entry.covered_percent >= threshold);

    CoveragePartition { good, bad }
}
