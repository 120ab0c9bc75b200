//! Recover command: restore a run from a named checkpoint.

use serde::Serialize;

use crate::core::RunStatus;
use crate::storage::StateStore;

/// Options for the recover command.
#[derive(Debug, Clone, Default)]
pub struct RecoverOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output of the recover command.
#[derive(Debug, Clone, Serialize)]
pub struct RecoverOutput {
    /// Whether recovery succeeded.
    pub success: bool,
    /// Run identifier.
    pub run_id: String,
    /// Checkpoint that was restored.
    pub name: String,
    /// Run status after recovery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The recover command implementation.
pub struct RecoverCommand<S: StateStore> {
    store: S,
}

impl<S: StateStore> RecoverCommand<S> {
    /// Create a new recover command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Restore the run from the named checkpoint.
    pub fn run(&self, run_id: &str, name: &str, _options: &RecoverOptions) -> RecoverOutput {
        match self.store.recover(run_id, name) {
            Ok(state) => RecoverOutput {
                success: true,
                run_id: run_id.to_string(),
                name: name.to_string(),
                status: Some(state.status),
                error: None,
            },
            Err(e) => RecoverOutput {
                success: false,
                run_id: run_id.to_string(),
                name: name.to_string(),
                status: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RecoverOutput, options: &RecoverOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if output.success {
            format!(
                "run {} recovered from checkpoint '{}'",
                output.run_id, output.name
            )
        } else {
            format!(
                "recovery failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
