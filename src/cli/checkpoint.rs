//! Checkpoint command: snapshot a run for later recovery.

use serde::Serialize;

use crate::storage::StateStore;

/// Options for the checkpoint command.
#[derive(Debug, Clone, Default)]
pub struct CheckpointOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output of the checkpoint command.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointOutput {
    /// Whether the checkpoint was taken.
    pub success: bool,
    /// Run identifier.
    pub run_id: String,
    /// Checkpoint name.
    pub name: String,
    /// Total checkpoints on the run after this one.
    pub checkpoint_count: usize,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The checkpoint command implementation.
pub struct CheckpointCommand<S: StateStore> {
    store: S,
}

impl<S: StateStore> CheckpointCommand<S> {
    /// Create a new checkpoint command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Take a named checkpoint of the run.
    pub fn run(&self, run_id: &str, name: &str, _options: &CheckpointOptions) -> CheckpointOutput {
        match self.store.checkpoint(run_id, name) {
            Ok(state) => CheckpointOutput {
                success: true,
                run_id: run_id.to_string(),
                name: name.to_string(),
                checkpoint_count: state.checkpoints.len(),
                error: None,
            },
            Err(e) => CheckpointOutput {
                success: false,
                run_id: run_id.to_string(),
                name: name.to_string(),
                checkpoint_count: 0,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CheckpointOutput, options: &CheckpointOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if output.success {
            format!(
                "checkpoint '{}' taken for run {} ({} total)",
                output.name, output.run_id, output.checkpoint_count
            )
        } else {
            format!(
                "checkpoint failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
