//! MessageCard payload assembly.
//!
//! The card is the fixed JSON document the webhook endpoint renders: one
//! section with a title, a subtitle, and either display facts or link
//! actions. Fact groups reproduce a merged header cell: only the first fact
//! of a group carries the group label, the rest carry an empty name.

use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

use crate::digest::commit_log::{group_items, Item};
use crate::digest::coverage::{CoverageEntry, CoveragePartition};
use crate::digest::duration::format_duration;
use crate::digest::export::ExportedReports;
use crate::digest::report::{RunOutcome, TestSummary};

const CARD_TYPE: &str = "MessageCard";
const CARD_CONTEXT: &str = "http://schema.org/extensions";

const DEPLOY_THEME_COLOR: &str = "0076D7";
const PASSED_THEME_COLOR: &str = "36A64F";
const FAILED_THEME_COLOR: &str = "C4314B";

/// MessageCard document delivered to the webhook endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MessageCard {
    /// Fixed document type marker.
    #[serde(rename = "@type")]
    pub card_type: String,
    /// Fixed schema context.
    #[serde(rename = "@context")]
    pub context: String,
    /// Accent color, six hex digits without `#`.
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    /// Plain-text summary shown in notification previews.
    pub summary: String,
    /// Display sections, in order.
    pub sections: Vec<Section>,
    /// Link actions, present only when report files were exported.
    #[serde(rename = "potentialAction", skip_serializing_if = "Option::is_none")]
    pub potential_action: Option<Vec<Action>>,
}

/// One display section of the card.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    /// Section title.
    #[serde(rename = "activityTitle")]
    pub activity_title: String,
    /// Section subtitle.
    #[serde(rename = "activitySubtitle")]
    pub activity_subtitle: String,
    /// Labeled display rows, in discovery order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<Fact>>,
    /// Whether the rendering surface treats text as markdown.
    pub markdown: bool,
}

/// A labeled display row.
#[derive(Debug, Clone, Serialize)]
pub struct Fact {
    /// Row label; empty for non-leading rows of a group.
    pub name: String,
    /// Row text.
    pub value: String,
}

/// An `OpenUri`-style link action.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    /// Fixed action type marker.
    #[serde(rename = "@type")]
    pub action_type: String,
    /// Action label.
    pub name: String,
    /// Link targets per platform.
    pub targets: Vec<ActionTarget>,
}

/// One link target of an action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionTarget {
    /// Target platform selector.
    pub os: String,
    /// Link URI.
    pub uri: String,
}

/// Builds the deployment digest card from classified commit log items.
pub fn deployment_card(branch: &str, environment: &str, items: &[Item]) -> MessageCard {
    let (features, fixes) = group_items(items);

    let mut facts = Vec::new();
    push_item_group(&mut facts, "User Stories:", &features);
    push_item_group(&mut facts, "Fixes:", &fixes);

    MessageCard {
        card_type: CARD_TYPE.to_string(),
        context: CARD_CONTEXT.to_string(),
        theme_color: DEPLOY_THEME_COLOR.to_string(),
        summary: format!("{branch} deployed"),
        sections: vec![Section {
            activity_title: format!("{branch} deployed"),
            activity_subtitle: format!("on {environment}"),
            facts: Some(facts),
            markdown: true,
        }],
        potential_action: None,
    }
}

/// Builds the test run digest card.
///
/// When report files were exported the card links them through `OpenUri`
/// actions resolved against `storage_base_url`; otherwise per-class coverage
/// is inlined as facts.
pub fn test_run_card(
    summary: &TestSummary,
    partition: &CoveragePartition,
    exported: &ExportedReports,
    storage_base_url: Option<&Url>,
) -> Result<MessageCard> {
    let theme_color = match summary.outcome {
        RunOutcome::Passed => PASSED_THEME_COLOR,
        RunOutcome::Failed => FAILED_THEME_COLOR,
    };

    let (facts, potential_action) = if exported.is_empty() {
        (Some(coverage_facts(partition)), None)
    } else {
        let base = storage_base_url
            .context("Storage URL is required to link exported report files")?;
        (None, Some(report_actions(exported, base)?))
    };

    Ok(MessageCard {
        card_type: CARD_TYPE.to_string(),
        context: CARD_CONTEXT.to_string(),
        theme_color: theme_color.to_string(),
        summary: format!("Test run {}", summary.run_id),
        sections: vec![Section {
            activity_title: title_text(summary),
            activity_subtitle: subtitle_text(summary),
            facts,
            markdown: true,
        }],
        potential_action,
    })
}

fn title_text(summary: &TestSummary) -> String {
    let color = match summary.outcome {
        RunOutcome::Passed => "#36a64f",
        RunOutcome::Failed => "#c4314b",
    };
    format!(
        "Test run {}: <span style=\"color:{}\"><strong>{}</strong></span>",
        summary.run_id,
        color,
        summary.outcome.label()
    )
}

fn subtitle_text(summary: &TestSummary) -> String {
    format!(
        "Started {}, ran {} tests in {}: {} passed ({}), {} failed ({}). Coverage {}%, org-wide {}%",
        summary.start_time,
        summary.tests_ran,
        format_duration(summary.execution_time_ms),
        summary.passing,
        summary.pass_rate,
        summary.failing,
        summary.fail_rate,
        summary.run_coverage_percent,
        summary.org_wide_coverage_percent
    )
}

fn coverage_facts(partition: &CoveragePartition) -> Vec<Fact> {
    let mut facts = Vec::new();
    push_coverage_group(&mut facts, "Good coverage:", &partition.good);
    push_coverage_group(&mut facts, "Bad coverage:", &partition.bad);
    facts
}

fn push_item_group(facts: &mut Vec<Fact>, label: &str, items: &[&Item]) {
    for (index, item) in items.iter().enumerate() {
        facts.push(Fact {
            name: group_label(label, index),
            value: format!("{} - {}", item.ticket, item.title),
        });
    }
}

fn push_coverage_group(facts: &mut Vec<Fact>, label: &str, entries: &[CoverageEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        facts.push(Fact {
            name: group_label(label, index),
            value: format!("{} - {}%", entry.name, entry.covered_percent),
        });
    }
}

fn group_label(label: &str, index: usize) -> String {
    if index == 0 {
        label.to_string()
    } else {
        String::new()
    }
}

fn report_actions(exported: &ExportedReports, base: &Url) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    for (label, path) in [
        ("Failed tests", &exported.failed_tests),
        ("Bad coverage", &exported.bad_coverage),
        ("Good coverage", &exported.good_coverage),
    ] {
        if let Some(path) = path {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Exported report has no file name: {}", path.display()))?;
            actions.push(open_uri(label, file_uri(base, file_name)?));
        }
    }
    Ok(actions)
}

fn file_uri(base: &Url, file_name: &str) -> Result<String> {
    // Url::join replaces the last path segment unless the base ends with '/'
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    let joined = base
        .join(file_name)
        .with_context(|| format!("Failed to resolve report link for {file_name}"))?;
    Ok(joined.to_string())
}

fn open_uri(name: &str, uri: String) -> Action {
    Action {
        action_type: "OpenUri".to_string(),
        name: name.to_string(),
        targets: vec![ActionTarget {
            os: "default".to_string(),
            uri,
        }],
    }
}
