//! Report command: build a prioritized action-item report.

use serde::{Deserialize, Serialize};

use crate::core::Violation;
use crate::gate::{build_report, Report};

/// Options for the report command.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Input: a bare array of violations or a wrapper object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReportInput {
    Bare(Vec<Violation>),
    Wrapped { violations: Vec<Violation> },
}

impl ReportInput {
    fn into_violations(self) -> Vec<Violation> {
        match self {
            ReportInput::Bare(v) => v,
            ReportInput::Wrapped { violations } => violations,
        }
    }
}

/// Output of the report command.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Whether the report was built.
    pub success: bool,
    /// The report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    /// Error message on bad input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The report command implementation.
#[derive(Default)]
pub struct ReportCommand;

impl ReportCommand {
    /// Create a new report command.
    pub fn new() -> Self {
        Self
    }

    /// Parse violations and build the report.
    pub fn run(&self, input_json: &str, _options: &ReportOptions) -> ReportOutput {
        let input: ReportInput = match serde_json::from_str(input_json) {
            Ok(input) => input,
            Err(e) => {
                return ReportOutput {
                    success: false,
                    report: None,
                    error: Some(format!("invalid input: {}", e)),
                }
            }
        };

        let report = build_report(&input.into_violations());
        ReportOutput {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ReportOutput, options: &ReportOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("report failed: {}", error);
        }

        let Some(report) = &output.report else {
            return String::new();
        };

        if report.action_items.is_empty() {
            return "no findings".to_string();
        }

        let mut lines = vec![format!(
            "overall {} ({} finding(s)){}",
            report.overall_severity,
            report.finding_count,
            if report.requires_immediate_action {
                " - immediate action required"
            } else {
                ""
            }
        )];
        for item in &report.action_items {
            lines.push(format!("[{}] {}", item.severity, item.action));
            lines.push(format!("  at: {}", item.locations.join(", ")));
            for step in &item.checklist {
                lines.push(format!("  - {}", step));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_bare_array() {
        let cmd = ReportCommand::new();
        let input = r#"[{
            "location": "concept/body",
            "rule": "line_count",
            "severity": "error",
            "message": "field 'body' has 9 lines, maximum is 8",
            "measured": 9,
            "limit": 8
        }]"#;
        let output = cmd.run(input, &ReportOptions::default());

        assert!(output.success);
        let report = output.report.unwrap();
        assert_eq!(report.finding_count, 1);
        assert_eq!(report.action_items.len(), 1);
    }

    #[test]
    fn test_report_empty_input() {
        let cmd = ReportCommand::new();
        let output = cmd.run("[]", &ReportOptions::default());

        assert!(output.success);
        assert_eq!(output.report.unwrap().finding_count, 0);
    }

    #[test]
    fn test_report_invalid_input() {
        let cmd = ReportCommand::new();
        let output = cmd.run("{bad", &ReportOptions::default());
        assert!(!output.success);
    }

    #[test]
    fn test_format_text_shows_checklist() {
        let cmd = ReportCommand::new();
        let input = r#"{"violations": [{
            "location": "concept/header",
            "rule": "required_field",
            "severity": "error",
            "message": "required field 'header' is missing"
        }]}"#;
        let output = cmd.run(input, &ReportOptions::default());
        let text = cmd.format_output(&output, &ReportOptions::default());

        assert!(text.contains("CRITICAL"));
        assert!(text.contains("immediate action required"));
        assert!(text.contains("concept/header"));
    }
}
