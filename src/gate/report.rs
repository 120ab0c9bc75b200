//! Turning violations into a prioritized, deduplicated action report.
//!
//! Findings are categorized, given a final severity via a lookup keyed by
//! (category, rule kind, field), and grouped by rule kind into action
//! items carrying a static remediation checklist.

use serde::{Deserialize, Serialize};

use crate::core::{RuleKind, Severity, Violation};

/// Coarse category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Shape of the artifact: line counts, lengths, required fields.
    Structural,
    /// Content rules: word ranges, marker tokens.
    ContentRule,
    /// Distribution across a collection: quotas and diversity.
    Distributional,
}

/// Final severity of a finding after the lookup table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportSeverity {
    /// Informational.
    #[default]
    Low,
    /// Worth fixing in the next pass.
    Medium,
    /// Should be fixed before acceptance.
    High,
    /// Blocks the pipeline.
    Critical,
}

impl std::fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportSeverity::Low => "LOW",
            ReportSeverity::Medium => "MEDIUM",
            ReportSeverity::High => "HIGH",
            ReportSeverity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// A deduplicated, actionable group of findings sharing one rule kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    /// The rule kind all grouped findings share.
    pub rule: RuleKind,
    /// Finding category of the rule kind.
    pub category: FindingCategory,
    /// Highest severity among the grouped findings.
    pub severity: ReportSeverity,
    /// Human action description.
    pub action: String,
    /// Affected locations, deduplicated, in first-seen order.
    pub locations: Vec<String>,
    /// Static remediation checklist for this rule kind.
    pub checklist: Vec<String>,
}

/// The prioritized report handed back to the generation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Action items, most severe first.
    pub action_items: Vec<ActionItem>,
    /// Number of findings that went into the report.
    pub finding_count: usize,
    /// Maximum severity among all findings.
    pub overall_severity: ReportSeverity,
    /// Set when any finding is HIGH or CRITICAL.
    pub requires_immediate_action: bool,
}

impl Report {
    /// An empty report: nothing to do.
    pub fn empty() -> Self {
        Self {
            action_items: Vec::new(),
            finding_count: 0,
            overall_severity: ReportSeverity::Low,
            requires_immediate_action: false,
        }
    }
}

/// Finding category for a rule kind.
pub fn categorize(rule: RuleKind) -> FindingCategory {
    match rule {
        RuleKind::LineCount | RuleKind::LineLength | RuleKind::RequiredField => {
            FindingCategory::Structural
        }
        RuleKind::WordCount | RuleKind::MarkerCount => FindingCategory::ContentRule,
        RuleKind::QuotaMinimum | RuleKind::QuotaTarget | RuleKind::QuotaDiversity => {
            FindingCategory::Distributional
        }
    }
}

/// Final severity lookup keyed by (category, rule kind, field), with a
/// default derived from the original severity as the fallback.
pub fn final_severity(
    category: FindingCategory,
    rule: RuleKind,
    field: &str,
    original: Severity,
) -> ReportSeverity {
    match (category, rule, field) {
        // Missing required structure blocks the pipeline outright
        (FindingCategory::Structural, RuleKind::RequiredField, _) => ReportSeverity::Critical,
        // An overlong body is the most common render-breaking defect
        (FindingCategory::Structural, RuleKind::LineCount, "body") => ReportSeverity::High,
        // Falling below a quota minimum blocks acceptance
        (FindingCategory::Distributional, RuleKind::QuotaMinimum, _) => ReportSeverity::High,
        // Diversity advisories stay informational
        (FindingCategory::Distributional, RuleKind::QuotaDiversity, _) => ReportSeverity::Low,
        _ => match original {
            Severity::Error => ReportSeverity::Medium,
            Severity::Warning => ReportSeverity::Low,
        },
    }
}

/// The field component of a violation location.
///
/// Locations look like `concept/body` or `concept/body:3`; the field is
/// the segment after the slash, stripped of any line suffix.
fn location_field(location: &str) -> &str {
    let after_slash = location.rsplit('/').next().unwrap_or(location);
    after_slash.split(':').next().unwrap_or(after_slash)
}

/// Human action description for a rule kind.
fn action_for(rule: RuleKind) -> &'static str {
    match rule {
        RuleKind::LineCount => "Trim fields to their configured line budgets",
        RuleKind::LineLength => "Break long lines to fit the character limit",
        RuleKind::RequiredField => "Add the missing required fields",
        RuleKind::WordCount => "Rework field length toward the configured word range",
        RuleKind::MarkerCount => "Insert the required pacing markers",
        RuleKind::QuotaMinimum => "Add special items to reach the band minimum",
        RuleKind::QuotaTarget => "Adjust special-item count toward the target range",
        RuleKind::QuotaDiversity => "Vary the sub-types of special items",
    }
}

/// Static remediation checklist per rule kind.
fn checklist_for(rule: RuleKind) -> Vec<String> {
    let steps: &[&str] = match rule {
        RuleKind::LineCount => &[
            "Merge short adjacent lines",
            "Move overflow content into the notes field",
            "Re-validate the unit after trimming",
        ],
        RuleKind::LineLength => &[
            "Split at clause boundaries",
            "Prefer shorter phrasing over hyphenation",
        ],
        RuleKind::RequiredField => &[
            "Check the generator template for dropped sections",
            "Regenerate the unit with all fields requested",
        ],
        RuleKind::WordCount => &[
            "Compare against the configured minimum and maximum",
            "Cut filler phrases before cutting content",
        ],
        RuleKind::MarkerCount => &[
            "Place markers at natural breathing points",
            "Keep at least the configured minimum per field",
        ],
        RuleKind::QuotaMinimum => &[
            "Identify sections lacking special items",
            "Convert a dense passage into a special item",
        ],
        RuleKind::QuotaTarget => &[
            "Rebalance special items across the collection",
        ],
        RuleKind::QuotaDiversity => &[
            "Swap duplicated sub-types for underused ones",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}

/// Build a prioritized action report from a set of findings.
///
/// Findings are grouped by rule kind, deduplicated by location, and
/// ordered most severe first. Overall severity is the maximum of any
/// finding; HIGH or CRITICAL sets `requires_immediate_action`.
pub fn build_report(violations: &[Violation]) -> Report {
    if violations.is_empty() {
        return Report::empty();
    }

    // Group by rule kind, preserving first-seen order of kinds
    let mut order: Vec<RuleKind> = Vec::new();
    for v in violations {
        if !order.contains(&v.rule) {
            order.push(v.rule);
        }
    }

    let mut action_items = Vec::new();
    let mut overall = ReportSeverity::Low;

    for rule in order {
        let group: Vec<&Violation> = violations.iter().filter(|v| v.rule == rule).collect();
        let category = categorize(rule);

        let mut severity = ReportSeverity::Low;
        let mut locations: Vec<String> = Vec::new();
        for v in &group {
            let s = final_severity(category, rule, location_field(&v.location), v.severity);
            severity = severity.max(s);
            if !locations.contains(&v.location) {
                locations.push(v.location.clone());
            }
        }
        overall = overall.max(severity);

        action_items.push(ActionItem {
            rule,
            category,
            severity,
            action: action_for(rule).to_string(),
            locations,
            checklist: checklist_for(rule),
        });
    }

    action_items.sort_by(|a, b| b.severity.cmp(&a.severity));

    Report {
        action_items,
        finding_count: violations.len(),
        overall_severity: overall,
        requires_immediate_action: overall >= ReportSeverity::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = build_report(&[]);
        assert!(report.action_items.is_empty());
        assert_eq!(report.finding_count, 0);
        assert_eq!(report.overall_severity, ReportSeverity::Low);
        assert!(!report.requires_immediate_action);
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize(RuleKind::LineCount), FindingCategory::Structural);
        assert_eq!(
            categorize(RuleKind::RequiredField),
            FindingCategory::Structural
        );
        assert_eq!(categorize(RuleKind::WordCount), FindingCategory::ContentRule);
        assert_eq!(
            categorize(RuleKind::MarkerCount),
            FindingCategory::ContentRule
        );
        assert_eq!(
            categorize(RuleKind::QuotaMinimum),
            FindingCategory::Distributional
        );
    }

    #[test]
    fn test_required_field_is_critical() {
        let s = final_severity(
            FindingCategory::Structural,
            RuleKind::RequiredField,
            "body",
            Severity::Error,
        );
        assert_eq!(s, ReportSeverity::Critical);
    }

    #[test]
    fn test_body_line_count_is_high() {
        let s = final_severity(
            FindingCategory::Structural,
            RuleKind::LineCount,
            "body",
            Severity::Error,
        );
        assert_eq!(s, ReportSeverity::High);
    }

    #[test]
    fn test_lookup_fallback_derives_from_original() {
        // Header line count has no specific entry; errors map to Medium
        let s = final_severity(
            FindingCategory::Structural,
            RuleKind::LineCount,
            "header",
            Severity::Error,
        );
        assert_eq!(s, ReportSeverity::Medium);

        let s = final_severity(
            FindingCategory::ContentRule,
            RuleKind::WordCount,
            "body",
            Severity::Warning,
        );
        assert_eq!(s, ReportSeverity::Low);
    }

    #[test]
    fn test_location_field_extraction() {
        assert_eq!(location_field("concept/body"), "body");
        assert_eq!(location_field("concept/body:9"), "body");
        assert_eq!(location_field("collection[14]"), "collection[14]");
    }

    #[test]
    fn test_grouping_dedupes_locations() {
        let violations = vec![
            Violation::error("concept/body:1", RuleKind::LineLength, "long"),
            Violation::error("concept/body:1", RuleKind::LineLength, "long again"),
            Violation::error("concept/body:4", RuleKind::LineLength, "long"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.action_items.len(), 1);
        assert_eq!(report.finding_count, 3);
        assert_eq!(
            report.action_items[0].locations,
            vec!["concept/body:1", "concept/body:4"]
        );
    }

    #[test]
    fn test_items_sorted_most_severe_first() {
        let violations = vec![
            Violation::warning("concept/body", RuleKind::WordCount, "short"),
            Violation::error("concept/header", RuleKind::RequiredField, "missing"),
            Violation::warning("collection[14]", RuleKind::QuotaTarget, "low"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.action_items[0].rule, RuleKind::RequiredField);
        assert_eq!(report.action_items[0].severity, ReportSeverity::Critical);
    }

    #[test]
    fn test_overall_severity_is_max() {
        let violations = vec![
            Violation::warning("concept/body", RuleKind::WordCount, "short"),
            Violation::error("collection[14]", RuleKind::QuotaMinimum, "deficit"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.overall_severity, ReportSeverity::High);
        assert!(report.requires_immediate_action);
    }

    #[test]
    fn test_low_findings_do_not_require_immediate_action() {
        let violations = vec![
            Violation::warning("concept/body", RuleKind::WordCount, "short"),
            Violation::warning("collection[14]", RuleKind::QuotaDiversity, "uniform"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.overall_severity, ReportSeverity::Low);
        assert!(!report.requires_immediate_action);
    }

    #[test]
    fn test_every_item_carries_a_checklist() {
        let violations = vec![
            Violation::error("concept/body", RuleKind::LineCount, "over"),
            Violation::warning("concept/body", RuleKind::MarkerCount, "missing"),
            Violation::error("collection[14]", RuleKind::QuotaMinimum, "deficit"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.action_items.len(), 3);
        for item in &report.action_items {
            assert!(!item.action.is_empty());
            assert!(!item.checklist.is_empty());
        }
    }

    #[test]
    fn test_mixed_group_takes_max_severity() {
        // One body line-count (High) and one header line-count (Medium)
        // grouped under the same rule kind report High.
        let violations = vec![
            Violation::error("concept/header", RuleKind::LineCount, "over"),
            Violation::error("concept/body", RuleKind::LineCount, "over"),
        ];
        let report = build_report(&violations);

        assert_eq!(report.action_items.len(), 1);
        assert_eq!(report.action_items[0].severity, ReportSeverity::High);
    }
}
