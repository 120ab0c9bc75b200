//! Init command: write a starter project configuration.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Overwrite an existing config.
    pub force: bool,
}

/// Output of the init command.
#[derive(Debug, Clone, Serialize)]
pub struct InitOutput {
    /// Whether the config was written.
    pub success: bool,
    /// Path of the written config.
    pub path: PathBuf,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The init command implementation.
pub struct InitCommand {
    cwd: PathBuf,
}

impl InitCommand {
    /// Create a new init command for the given directory.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Write `.lectern/config.toml` with the default tables.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let config_path = self.cwd.join(".lectern").join("config.toml");

        if config_path.exists() && !options.force {
            return InitOutput {
                success: false,
                path: config_path,
                error: Some("config already exists (use --force to overwrite)".to_string()),
            };
        }

        let config = Config::default();
        match config.save_project(Path::new(&self.cwd)) {
            Ok(()) => InitOutput {
                success: true,
                path: config_path,
                error: None,
            },
            Err(e) => InitOutput {
                success: false,
                path: config_path,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if output.success {
            format!("wrote {}", output.path.display())
        } else {
            format!(
                "init failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
