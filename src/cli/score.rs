//! Score command: evaluate the quality gate.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::Violation;
use crate::gate::{score_gate, GateResult, GateStatus, ScoreCategory};
use crate::runner::derive_dimensions;

/// Options for the score command.
#[derive(Debug, Clone, Default)]
pub struct ScoreOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Input for the score command.
///
/// Either explicit dimension scores, or violations from which the
/// dimensions are derived via the deductive rubric.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreInput {
    /// Explicit dimension scores; takes precedence when present.
    #[serde(default)]
    pub dimensions: Vec<ScoreCategory>,
    /// Violations to derive dimensions from.
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// Output of the score command.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreOutput {
    /// True when the gate did not fail.
    pub success: bool,
    /// The gate result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateResult>,
    /// Error message when scoring could not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The score command implementation.
pub struct ScoreCommand {
    config: Config,
}

impl ScoreCommand {
    /// Create a new score command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse input and evaluate the gate.
    pub fn run(&self, input_json: &str, _options: &ScoreOptions) -> ScoreOutput {
        let input: ScoreInput = match serde_json::from_str(input_json) {
            Ok(input) => input,
            Err(e) => {
                return ScoreOutput {
                    success: false,
                    gate: None,
                    error: Some(format!("invalid input: {}", e)),
                }
            }
        };

        let dimensions = if input.dimensions.is_empty() {
            derive_dimensions(&input.violations, &self.config.gate)
        } else {
            input.dimensions
        };

        match score_gate(dimensions, &self.config.gate) {
            Ok(gate) => ScoreOutput {
                success: gate.status != GateStatus::Fail,
                gate: Some(gate),
                error: None,
            },
            Err(e) => ScoreOutput {
                success: false,
                gate: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ScoreOutput, options: &ScoreOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("scoring failed: {}", error);
        }

        let Some(gate) = &output.gate else {
            return String::new();
        };

        let mut lines = vec![format!(
            "{} (weighted total {:.1})",
            gate.status, gate.weighted_total
        )];
        for dim in &gate.dimensions {
            lines.push(format!(
                "  {}: {:.1} (weight {:.2})",
                dim.id, dim.score, dim.weight
            ));
        }
        for auto_fail in &gate.auto_fails {
            lines.push(format!("  automatic fail: {}", auto_fail));
        }
        lines.join("\n")
    }
}
