//! Validate command: constraint and quota checks over content units.

use serde::{Deserialize, Serialize};

use crate::checks::{check_quota, validate_unit, QuotaResult};
use crate::config::Config;
use crate::core::{ContentUnit, Severity, Violation};

/// Options for the validate command.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Input for the validate command.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateInput {
    /// Content units to check.
    pub units: Vec<ContentUnit>,
    /// Collection size for the quota check; quota is skipped when absent.
    #[serde(default)]
    pub collection_size: Option<u32>,
    /// Special-item count for the quota check.
    #[serde(default)]
    pub special_count: u32,
    /// Sub-type tags of the special items.
    #[serde(default)]
    pub special_subtypes: Vec<String>,
}

/// Output of the validate command.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    /// True when no blocking findings remain.
    pub success: bool,
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Quota result, when a collection size was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaResult>,
    /// Error message when validation itself could not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            violations: Vec::new(),
            quota: None,
            error: Some(error.into()),
        }
    }
}

/// The validate command implementation.
pub struct ValidateCommand {
    config: Config,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse input and run constraint + quota checks.
    pub fn run(&self, input_json: &str, _options: &ValidateOptions) -> ValidateOutput {
        let input: ValidateInput = match serde_json::from_str(input_json) {
            Ok(input) => input,
            Err(e) => return ValidateOutput::failure(format!("invalid input: {}", e)),
        };

        let mut violations = Vec::new();
        for unit in &input.units {
            violations.extend(validate_unit(unit, &self.config.limits));
        }

        let quota = match input.collection_size {
            Some(size) => {
                match check_quota(
                    size,
                    input.special_count,
                    &input.special_subtypes,
                    &self.config.quotas,
                ) {
                    Ok(result) => {
                        violations.extend(result.violations.clone());
                        Some(result)
                    }
                    Err(e) => return ValidateOutput::failure(e.to_string()),
                }
            }
            None => None,
        };

        // Errors block; warnings are advisory
        let blocking = violations.iter().any(|v| v.severity == Severity::Error);

        ValidateOutput {
            success: !blocking,
            violations,
            quota,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ValidateOutput, options: &ValidateOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("validation failed: {}", error);
        }

        if output.violations.is_empty() {
            return "all checks passed".to_string();
        }

        let mut lines = vec![format!("{} finding(s)", output.violations.len())];
        for v in &output.violations {
            lines.push(format!("  {} {} {}: {}", v.severity, v.rule, v.location, v.message));
        }
        if let Some(quota) = &output.quota {
            lines.push(format!("quota: {:?}", quota.verdict));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuleKind;

    fn command() -> ValidateCommand {
        ValidateCommand::new(Config::default())
    }

    fn clean_unit_json() -> String {
        let lines: Vec<String> = (0..5)
            .map(|i| format!("line {} with a few words of content [pause]", i))
            .collect();
        serde_json::json!({
            "category": "foundations",
            "unit_type": "concept",
            "fields": [
                {"name": "header", "lines": ["Heading"]},
                {"name": "body", "lines": lines}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_clean_unit_succeeds() {
        let cmd = command();
        let input = format!(r#"{{"units": [{}]}}"#, clean_unit_json());
        let output = cmd.run(&input, &ValidateOptions::default());

        assert!(output.success, "{:?}", output.violations);
        assert!(output.violations.is_empty());
        assert!(output.quota.is_none());
    }

    #[test]
    fn test_missing_required_field_blocks() {
        let cmd = command();
        let input = r#"{"units": [{"category": "foundations", "unit_type": "concept", "fields": []}]}"#;
        let output = cmd.run(input, &ValidateOptions::default());

        assert!(!output.success);
        assert!(output
            .violations
            .iter()
            .any(|v| v.rule == RuleKind::RequiredField));
    }

    #[test]
    fn test_quota_included_when_size_given() {
        let cmd = command();
        let input = format!(
            r#"{{"units": [{}], "collection_size": 14, "special_count": 1}}"#,
            clean_unit_json()
        );
        let output = cmd.run(&input, &ValidateOptions::default());

        assert!(!output.success); // deficit of 1 is blocking
        let quota = output.quota.unwrap();
        assert!(quota.verdict.is_blocking());
    }

    #[test]
    fn test_uncovered_collection_size_is_failure() {
        let cmd = command();
        let input = format!(
            r#"{{"units": [{}], "collection_size": 999, "special_count": 1}}"#,
            clean_unit_json()
        );
        let output = cmd.run(&input, &ValidateOptions::default());

        assert!(!output.success);
        assert!(output.error.as_deref().unwrap().contains("quota band"));
    }

    #[test]
    fn test_warnings_do_not_block() {
        let cmd = command();
        // Body present but with no pacing marker: warning only
        let lines: Vec<String> = (0..5)
            .map(|i| format!("line {} with plenty of words in the body", i))
            .collect();
        let unit = serde_json::json!({
            "category": "foundations",
            "unit_type": "concept",
            "fields": [
                {"name": "header", "lines": ["Heading"]},
                {"name": "body", "lines": lines}
            ]
        });
        let input = format!(r#"{{"units": [{}]}}"#, unit);
        let output = cmd.run(&input, &ValidateOptions::default());

        assert!(output.success);
        assert!(!output.violations.is_empty());
    }

    #[test]
    fn test_format_text_lists_findings() {
        let cmd = command();
        let input = r#"{"units": [{"category": "foundations", "unit_type": "concept", "fields": []}]}"#;
        let output = cmd.run(input, &ValidateOptions::default());
        let text = cmd.format_output(&output, &ValidateOptions::default());

        assert!(text.contains("finding(s)"));
        assert!(text.contains("required-field"));
    }
}
