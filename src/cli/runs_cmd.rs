//! Runs command: list persisted runs.

use serde::Serialize;

use crate::core::{PipelineState, StoreHealth};
use crate::storage::StateStore;

/// Options for the runs command.
#[derive(Debug, Clone)]
pub struct RunsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of runs to show.
    pub limit: usize,
}

impl Default for RunsOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            limit: 20,
        }
    }
}

/// One row of the runs listing.
#[derive(Debug, Clone, Serialize)]
pub struct RunRow {
    /// Run identifier.
    pub run_id: String,
    /// Current status.
    pub status: String,
    /// Current step.
    pub step: String,
    /// Section count.
    pub sections: usize,
    /// Checkpoint count.
    pub checkpoints: usize,
    /// Store health of the record.
    pub health: StoreHealth,
    /// Last-modified timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Output of the runs command.
#[derive(Debug, Clone, Serialize)]
pub struct RunsOutput {
    /// Whether listing succeeded.
    pub success: bool,
    /// Listed runs, most recent first.
    pub runs: Vec<RunRow>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The runs command implementation.
pub struct RunsCommand<S: StateStore> {
    store: S,
}

impl<S: StateStore> RunsCommand<S> {
    /// Create a new runs command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// List persisted runs.
    pub fn run(&self, options: &RunsOptions) -> RunsOutput {
        let states: Vec<PipelineState> = match self.store.list(options.limit) {
            Ok(states) => states,
            Err(e) => {
                return RunsOutput {
                    success: false,
                    runs: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        let runs = states
            .into_iter()
            .map(|state| {
                let health = self
                    .store
                    .validate(&state.run_id)
                    .unwrap_or(StoreHealth::Valid);
                RunRow {
                    run_id: state.run_id.clone(),
                    status: state.status.to_string(),
                    step: state.step.clone(),
                    sections: state.sections.len(),
                    checkpoints: state.checkpoints.len(),
                    health,
                    updated_at: state.updated_at,
                }
            })
            .collect();

        RunsOutput {
            success: true,
            runs,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RunsOutput, options: &RunsOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("listing failed: {}", error);
        }
        if output.runs.is_empty() {
            return "no runs".to_string();
        }

        let mut lines = Vec::new();
        for row in &output.runs {
            let health = match &row.health {
                StoreHealth::Valid => String::new(),
                StoreHealth::Invalid { problems } => {
                    format!(" [INVALID: {}]", problems.join("; "))
                }
                StoreHealth::Corrupted { detail } => format!(" [CORRUPTED: {}]", detail),
            };
            lines.push(format!(
                "{}  {}  step={}  sections={}  checkpoints={}{}",
                row.run_id, row.status, row.step, row.sections, row.checkpoints, health
            ));
        }
        lines.join("\n")
    }
}
