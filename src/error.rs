//! Unified error types for lectern.
//!
//! Every failure surfaces as structured data naming the failing rule,
//! field, or path. Validation findings travel as `Violation` values, not
//! errors; this type covers infrastructure and contract faults only.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    /// I/O errors from state file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading or consistency errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// A rule implementation fault during classification.
    ///
    /// Aborts the whole batch; partial assignments are never emitted.
    #[error("classification error in rule {rule}: {message}")]
    Classification { rule: String, message: String },

    /// State machine violations (invalid transitions, bad write requests).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Persisted state exists but cannot be parsed.
    ///
    /// Distinct from `InvalidState`: corruption is unrecoverable without a
    /// checkpoint, inconsistency may be repairable.
    #[error("corrupted state for run {run_id}: {detail}")]
    Corrupted { run_id: String, detail: String },

    /// Run not found in the state store.
    #[error("run not found: {run_id}")]
    RunNotFound { run_id: String },

    /// Checkpoint not found in a run record.
    #[error("checkpoint not found: {name} (run {run_id})")]
    CheckpointNotFound { run_id: String, name: String },
}

/// A specialized Result type for lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;

impl LecternError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a classification error.
    pub fn classification(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Classification {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a corrupted-state error.
    pub fn corrupted(run_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Corrupted {
            run_id: run_id.into(),
            detail: detail.into(),
        }
    }

    /// Create a run not found error.
    pub fn run_not_found(run_id: impl Into<String>) -> Self {
        Self::RunNotFound {
            run_id: run_id.into(),
        }
    }

    /// Create a checkpoint not found error.
    pub fn checkpoint_not_found(run_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::CheckpointNotFound {
            run_id: run_id.into(),
            name: name.into(),
        }
    }
}

impl From<io::Error> for LecternError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for LecternError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Exit codes for the lectern CLI.
pub mod exit_codes {
    /// Exit code for success (gate passed, command completed).
    pub const OK: i32 = 0;

    /// Exit code for a command that completed but reported a failure
    /// (gate FAIL, blocking violations, invalid state).
    pub const FAIL: i32 = 1;

    /// Exit code for an infrastructure error (I/O, corrupt store).
    pub const ERROR: i32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = LecternError::storage(
            "/tmp/run.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/run.json"));
    }

    #[test]
    fn test_serde_error_display() {
        let err = LecternError::serde("invalid JSON");
        assert_eq!(err.to_string(), "serialization error: invalid JSON");
    }

    #[test]
    fn test_config_error_display() {
        let err = LecternError::config("weights sum to 0.9");
        assert_eq!(err.to_string(), "config error: weights sum to 0.9");
    }

    #[test]
    fn test_classification_error_names_rule() {
        let err = LecternError::classification("secondary/period-focus", "bad year range");
        assert!(err.to_string().contains("secondary/period-focus"));
        assert!(err.to_string().contains("bad year range"));
    }

    #[test]
    fn test_corrupted_vs_invalid_state_are_distinct() {
        let corrupted = LecternError::corrupted("run-1", "unexpected EOF");
        let invalid = LecternError::invalid_state("section done before run started");
        assert!(matches!(corrupted, LecternError::Corrupted { .. }));
        assert!(matches!(invalid, LecternError::InvalidState { .. }));
        assert!(corrupted.to_string().contains("run-1"));
    }

    #[test]
    fn test_checkpoint_not_found_display() {
        let err = LecternError::checkpoint_not_found("run-7", "before-review");
        assert_eq!(
            err.to_string(),
            "checkpoint not found: before-review (run run-7)"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: LecternError = io_err.into();
        assert!(matches!(err, LecternError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: LecternError = json_err.into();
        assert!(matches!(err, LecternError::Serde { .. }));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::OK, 0);
        assert_eq!(exit_codes::FAIL, 1);
        assert_eq!(exit_codes::ERROR, 2);
    }
}
