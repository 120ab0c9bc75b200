//! Clean command: delete old run records.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::storage::StateStore;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Remove runs last updated before this duration ago (e.g. "7d", "24h").
    pub before: Option<String>,
    /// Show what would be cleaned without removing.
    pub dry_run: bool,
}

/// Output of the clean command.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutput {
    /// Whether cleaning succeeded.
    pub success: bool,
    /// Run ids that were (or would be) removed.
    pub removed: Vec<String>,
    /// True when this was a dry run.
    pub dry_run: bool,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            removed: Vec::new(),
            dry_run: false,
            error: Some(error.into()),
        }
    }
}

/// Parse a duration like `7d`, `24h`, or `90m`.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }
    let (value, unit) = s.split_at(s.len() - 1);
    let value: i64 = value.parse().ok()?;
    match unit {
        "d" => Some(Duration::days(value)),
        "h" => Some(Duration::hours(value)),
        "m" => Some(Duration::minutes(value)),
        _ => None,
    }
}

/// The clean command implementation.
pub struct CleanCommand<S: StateStore> {
    store: S,
}

impl<S: StateStore> CleanCommand<S> {
    /// Create a new clean command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Remove runs older than the given cutoff.
    pub fn run(&self, options: &CleanOptions) -> CleanOutput {
        let before = match &options.before {
            Some(spec) => match parse_duration(spec) {
                Some(duration) => duration,
                None => {
                    return CleanOutput::failure(format!(
                        "invalid duration '{}' (expected e.g. 7d, 24h, 90m)",
                        spec
                    ))
                }
            },
            None => return CleanOutput::failure("no cutoff given (use --before)"),
        };

        let cutoff = Utc::now() - before;

        let runs = match self.store.list(usize::MAX) {
            Ok(runs) => runs,
            Err(e) => return CleanOutput::failure(e.to_string()),
        };

        let mut removed = Vec::new();
        for run in runs {
            if run.updated_at < cutoff {
                if !options.dry_run {
                    if let Err(e) = self.store.delete(&run.run_id) {
                        return CleanOutput::failure(e.to_string());
                    }
                }
                removed.push(run.run_id);
            }
        }

        CleanOutput {
            success: true,
            removed,
            dry_run: options.dry_run,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CleanOutput, options: &CleanOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if let Some(error) = &output.error {
            return format!("clean failed: {}", error);
        }

        let verb = if output.dry_run { "would remove" } else { "removed" };
        if output.removed.is_empty() {
            format!("{} 0 runs", verb)
        } else {
            format!("{} {} run(s): {}", verb, output.removed.len(), output.removed.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateWriteRequest;
    use crate::storage::MemoryStateStore;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("7d"), Some(Duration::days(7)));
        assert_eq!(parse_duration("24h"), Some(Duration::hours(24)));
        assert_eq!(parse_duration("90m"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("x"), None);
        assert_eq!(parse_duration("7w"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_clean_requires_cutoff() {
        let cmd = CleanCommand::new(MemoryStateStore::new());
        let output = cmd.run(&CleanOptions::default());
        assert!(!output.success);
    }

    #[test]
    fn test_clean_keeps_recent_runs() {
        let store = MemoryStateStore::new();
        store.write("run-1", StateWriteRequest::default()).unwrap();

        let cmd = CleanCommand::new(store.clone());
        let output = cmd.run(&CleanOptions {
            before: Some("1h".to_string()),
            ..Default::default()
        });

        assert!(output.success);
        assert!(output.removed.is_empty());
        assert!(store.exists("run-1").unwrap());
    }

    #[test]
    fn test_clean_dry_run_removes_nothing() {
        let store = MemoryStateStore::new();
        store.write("run-1", StateWriteRequest::default()).unwrap();

        // A zero-minute cutoff makes every run "old" except ones updated
        // this instant; sleep briefly to be safe.
        std::thread::sleep(std::time::Duration::from_millis(5));

        let cmd = CleanCommand::new(store.clone());
        let output = cmd.run(&CleanOptions {
            before: Some("0m".to_string()),
            dry_run: true,
            ..Default::default()
        });

        assert!(output.success);
        assert_eq!(output.removed, vec!["run-1".to_string()]);
        assert!(store.exists("run-1").unwrap());
    }

    #[test]
    fn test_clean_removes_old_runs() {
        let store = MemoryStateStore::new();
        store.write("run-1", StateWriteRequest::default()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let cmd = CleanCommand::new(store.clone());
        let output = cmd.run(&CleanOptions {
            before: Some("0m".to_string()),
            ..Default::default()
        });

        assert!(output.success);
        assert!(!store.exists("run-1").unwrap());
    }
}
