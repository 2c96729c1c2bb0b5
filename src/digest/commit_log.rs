//! Commit log parsing and ticket item classification.

use anyhow::{Context, Result};
use regex::RegexBuilder;

/// Default pattern matching `<ticket> / <Feature|Fix> / <title>` log lines.
pub const DEFAULT_LOG_PATTERN: &str = "[0-9]{5,} / (Feature|Fix).*";

/// Marker stripped from matched lines before splitting.
const CI_SKIP_MARKER: &str = "[ci skip]";

/// Classification of a commit log item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A user-facing feature entry.
    Feature,
    /// A defect fix entry (the default when the keyword is absent).
    Fix,
}

/// One classified entry extracted from the commit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Ticket number (first `/`-separated segment, trimmed).
    pub ticket: String,
    /// Item title (third segment, trimmed; keeps embedded slashes).
    pub title: String,
    /// Feature/fix classification.
    pub kind: ItemKind,
}

/// Extracts classified items from raw commit log text.
///
/// Matches `pattern` (the default ticket pattern when `None`) against the
/// full text, case-insensitively unless `case_sensitive` is set. Items come
/// back in order of appearance, which for `git log` output is newest first.
/// A log with no matching lines yields an empty list, never an error.
pub fn parse_commit_log(
    log_text: &str,
    pattern: Option<&str>,
    case_sensitive: bool,
) -> Result<Vec<Item>> {
    let pattern = pattern.unwrap_or(DEFAULT_LOG_PATTERN);
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .with_context(|| format!("Invalid commit log pattern: {pattern}"))?;

    let mut items = Vec::new();
    for matched in regex.find_iter(log_text) {
        let line = matched.as_str().replace(CI_SKIP_MARKER, "");
        let mut segments = line.splitn(3, '/');
        let ticket = segments.next().unwrap_or("").trim().to_string();
        let keyword = segments.next().unwrap_or("").trim().to_string();
        let title = segments.next().unwrap_or("").trim().to_string();

        // Anything without an explicit Feature keyword counts as a fix
        let kind = if contains_keyword(&keyword, "Feature", case_sensitive) {
            ItemKind::Feature
        } else {
            ItemKind::Fix
        };

        items.push(Item {
            ticket,
            title,
            kind,
        });
    }

    tracing::debug!(count = items.len(), "extracted commit log items");
    Ok(items)
}

fn contains_keyword(segment: &str, keyword: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        segment.contains(keyword)
    } else {
        segment.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// Splits items into (features, fixes), preserving relative order.
pub fn group_items(items: &[Item]) -> (Vec<&Item>, Vec<&Item>) {
    items.iter().partition(|item| item.kind == ItemKind::Feature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_pattern() {
        let log = "a1b2c3 12345 / Feature / Add export\n4d5e6f 12346 / Fix / Null pointer";
        let items = parse_commit_log(log, None, false).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ticket, "12345");
        assert_eq!(items[0].title, "Add export");
        assert_eq!(items[0].kind, ItemKind::Feature);
        assert_eq!(items[1].ticket, "12346");
        assert_eq!(items[1].title, "Null pointer");
        assert_eq!(items[1].kind, ItemKind::Fix);
    }

    #[test]
    fn parse_strips_ci_skip_marker() {
        let log = "12345 / Fix / Quiet release [ci skip]";
        let items = parse_commit_log(log, None, false).unwrap();

        assert_eq!(items[0].title, "Quiet release");
    }

    #[test]
    fn parse_is_case_insensitive_by_default() {
        let log = "12345 / feature / lower case keyword";
        let items = parse_commit_log(log, None, false).unwrap();

        assert_eq!(items[0].kind, ItemKind::Feature);
    }

    #[test]
    fn parse_case_sensitive_demotes_lowercase_keyword() {
        let log = "12345 / Feature / Kept\n12346 / feature / Demoted";
        let items = parse_commit_log(log, Some("[0-9]{5,} / [a-zA-Z]+ /.*"), true).unwrap();

        assert_eq!(items[0].kind, ItemKind::Feature);
        assert_eq!(items[1].kind, ItemKind::Fix);
    }

    #[test]
    fn parse_no_matches_yields_empty_list() {
        let items = parse_commit_log("chore: bump deps\nMerge branch 'main'", None, false).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn parse_rejects_invalid_pattern() {
        assert!(parse_commit_log("12345 / Fix / x", Some("([0-9]"), false).is_err());
    }

    #[test]
    fn parse_missing_segments_default_to_empty() {
        let items = parse_commit_log("12345 / Fix", Some("[0-9]{5,} /.*"), false).unwrap();

        assert_eq!(items[0].ticket, "12345");
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].kind, ItemKind::Fix);
    }

    #[test]
    fn parse_missing_keyword_classifies_as_fix() {
        let items = parse_commit_log("12345", Some("[0-9]{5,}"), false).unwrap();

        assert_eq!(items[0].ticket, "12345");
        assert_eq!(items[0].kind, ItemKind::Fix);
    }

    #[test]
    fn extracted_tickets_are_numeric() {
        let log = "abc1234 56789 / Feature / One\nxyz9 443211 / Fix / Two [ci skip]";
        let items = parse_commit_log(log, None, false).unwrap();

        assert_eq!(items.len(), 2);
        for item in &items {
            assert!(item.ticket.len() >= 5);
            assert!(item.ticket.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn title_keeps_embedded_slashes() {
        let items = parse_commit_log("12345 / Feature / Export to csv/html", None, false).unwrap();
        assert_eq!(items[0].title, "Export to csv/html");
    }

    #[test]
    fn group_items_is_stable() {
        let log = "11111 / Fix / a\n22222 / Feature / b\n33333 / Fix / c\n44444 / Feature / d";
        let items = parse_commit_log(log, None, false).unwrap();
        let (features, fixes) = group_items(&items);

        assert_eq!(
            features.iter().map(|i| i.ticket.as_str()).collect::<Vec<_>>(),
            ["22222", "44444"]
        );
        assert_eq!(
            fixes.iter().map(|i| i.ticket.as_str()).collect::<Vec<_>>(),
            ["11111", "33333"]
        );
    }
}
