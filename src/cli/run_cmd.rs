//! Run command: the full pipeline over a sections file.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::RunStatus;
use crate::runner::{run_pipeline, RunSummary, Section};
use crate::storage::StateStore;

/// Options for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Input for the run command.
#[derive(Debug, Clone, Deserialize)]
pub struct RunInput {
    /// Run identifier; may also come from the CLI flag.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Sections to process.
    pub sections: Vec<Section>,
}

/// Output of the run command.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// True when the run completed with every section accepted.
    pub success: bool,
    /// The run summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
    /// Error message when the run could not execute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The run command implementation.
pub struct RunCommand<S: StateStore> {
    store: S,
    config: Config,
}

impl<S: StateStore> RunCommand<S> {
    /// Create a new run command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Parse the sections file and execute the pipeline.
    pub fn run(&self, input_json: &str, run_id: Option<&str>, _options: &RunOptions) -> RunOutput {
        let input: RunInput = match serde_json::from_str(input_json) {
            Ok(input) => input,
            Err(e) => {
                return RunOutput {
                    success: false,
                    summary: None,
                    error: Some(format!("invalid input: {}", e)),
                }
            }
        };

        let run_id = match run_id.map(str::to_string).or(input.run_id) {
            Some(id) => id,
            None => {
                return RunOutput {
                    success: false,
                    summary: None,
                    error: Some("no run id given (use --run-id or the run_id field)".to_string()),
                }
            }
        };

        match run_pipeline(&self.store, &self.config, &run_id, &input.sections) {
            Ok(summary) => {
                let accepted = summary.status == RunStatus::Completed
                    && summary.sections.iter().all(|s| s.accepted());
                RunOutput {
                    success: accepted,
                    summary: Some(summary),
                    error: None,
                }
            }
            Err(e) => RunOutput {
                success: false,
                summary: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RunOutput, options: &RunOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("run failed: {}", error);
        }

        let Some(summary) = &output.summary else {
            return String::new();
        };

        let mut lines = vec![format!("run {} {}", summary.run_id, summary.status)];
        for section in &summary.sections {
            lines.push(format!(
                "  {}: gate {} ({} finding(s)){}",
                section.name,
                section.gate.status,
                section.violations.len(),
                if section.accepted() { "" } else { " - blocked" }
            ));
        }
        for name in &summary.skipped {
            lines.push(format!("  {}: skipped (already completed)", name));
        }
        for (name, error) in &summary.failed {
            lines.push(format!("  {}: failed: {}", name, error));
        }
        lines.join("\n")
    }
}
