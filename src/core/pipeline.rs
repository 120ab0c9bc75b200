//! Pipeline state record and checkpoints.
//!
//! One mutable `PipelineState` exists per run. Every stage mutates it
//! through guarded transitions or merge-writes and the store persists it
//! after every mutation. Checkpoints are immutable full snapshots used
//! only for recovery, the single permitted rewind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};

/// Overall status of a pipeline run.
///
/// Transitions are monotonic forward; `Recovered` is reachable only via
/// explicit recovery from a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, nothing processed yet.
    #[default]
    Pending,
    /// At least one section is being processed.
    InProgress,
    /// All sections completed.
    Completed,
    /// An unrecoverable error occurred mid-run.
    Failed,
    /// Live record was replaced from a checkpoint.
    Recovered,
}

impl RunStatus {
    /// Check if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Check whether a forward transition to `next` is permitted.
    ///
    /// `Recovered` is never a valid target here; only `recover()` sets it.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::InProgress)
                | (RunStatus::InProgress, RunStatus::Completed)
                | (RunStatus::InProgress, RunStatus::Failed)
                | (RunStatus::Recovered, RunStatus::InProgress)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Recovered => "recovered",
        };
        f.write_str(s)
    }
}

/// Status of one section within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// Not yet started.
    #[default]
    Pending,
    /// A worker is processing it.
    InProgress,
    /// Processed and persisted.
    Completed,
    /// Processing failed.
    Failed,
}

/// One entry in the run's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// What went wrong.
    pub message: String,
    /// Step during which it happened, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// When it was recorded.
    pub at: DateTime<Utc>,
}

impl ErrorEntry {
    /// Create a new error entry timestamped now.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            step: None,
            at: Utc::now(),
        }
    }

    /// Attach the step the error occurred in.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

/// Immutable named snapshot of a run, used only for recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint name, unique within the run.
    pub name: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Full copy of the state at snapshot time, including the checkpoints
    /// taken before it.
    pub snapshot: Box<PipelineState>,
}

/// The single mutable record describing a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Run identifier.
    pub run_id: String,
    /// Current pipeline step, e.g. `"classify"` or `"score"`.
    pub step: String,
    /// Section currently being processed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Overall run status.
    pub status: RunStatus,
    /// Per-section status map, keyed by section name.
    pub sections: BTreeMap<String, SectionStatus>,
    /// Accumulated error log.
    pub errors: Vec<ErrorEntry>,
    /// Named checkpoints, in creation order.
    pub checkpoints: Vec<Checkpoint>,
    /// When the run record was created.
    pub created_at: DateTime<Utc>,
    /// Monotonically increasing last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl PipelineState {
    /// Create an empty template for a new run.
    pub fn new(run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            step: "init".to_string(),
            section: None,
            status: RunStatus::Pending,
            sections: BTreeMap::new(),
            errors: Vec::new(),
            checkpoints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the last-modified timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a merge-write to the record.
    ///
    /// Scalar fields overwrite, the section map merges by key, error
    /// entries append, and `updated_at` is always refreshed. A status
    /// update must be a permitted forward transition; `Recovered` cannot
    /// be written, only produced by `restore_from`.
    pub fn apply(&mut self, updates: StateWriteRequest) -> Result<()> {
        if let Some(status) = updates.status {
            if status == RunStatus::Recovered {
                return Err(LecternError::invalid_state(
                    "status 'recovered' is only reachable via recovery",
                ));
            }
            if !self.status.can_transition_to(status) {
                return Err(LecternError::invalid_state(format!(
                    "cannot transition run {} from {} to {}",
                    self.run_id, self.status, status
                )));
            }
            self.status = status;
        }

        if let Some(step) = updates.step {
            self.step = step;
        }
        if let Some(section) = updates.section {
            self.section = Some(section);
        }
        for (name, status) in updates.sections {
            self.sections.insert(name, status);
        }
        self.errors.extend(updates.errors);

        self.touch();
        Ok(())
    }

    /// Take a named snapshot of the current record.
    ///
    /// The snapshot is an independent copy; later mutations of the live
    /// record do not affect it. Duplicate names are rejected, and names
    /// are restricted so stores can use them in file names.
    pub fn checkpoint(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LecternError::invalid_state(format!(
                "checkpoint name '{}' must be non-empty alphanumeric with '-' or '_'",
                name
            )));
        }
        if self.find_checkpoint(&name).is_some() {
            return Err(LecternError::invalid_state(format!(
                "checkpoint '{}' already exists for run {}",
                name, self.run_id
            )));
        }

        let snapshot = Box::new(self.clone());
        self.checkpoints.push(Checkpoint {
            name,
            created_at: Utc::now(),
            snapshot,
        });
        self.touch();
        Ok(())
    }

    /// Look up a checkpoint by name.
    pub fn find_checkpoint(&self, name: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.name == name)
    }

    /// Replace the live record with a checkpoint snapshot.
    ///
    /// This is the only permitted rewind. The restored record is marked
    /// `Recovered` and its timestamp refreshed. The checkpoint list is
    /// append-only and survives the rewind, so the same checkpoint can be
    /// recovered to again after a later failure.
    pub fn restore_from(&mut self, checkpoint: &Checkpoint) {
        let checkpoints = std::mem::take(&mut self.checkpoints);
        *self = (*checkpoint.snapshot).clone();
        self.checkpoints = checkpoints;
        self.status = RunStatus::Recovered;
        self.touch();
    }

    /// Cross-field consistency check.
    ///
    /// Returns a list of problems; empty means consistent. Schema validity
    /// is implied by the record having deserialized at all.
    pub fn consistency_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.updated_at < self.created_at {
            problems.push(format!(
                "updated_at {} precedes created_at {}",
                self.updated_at, self.created_at
            ));
        }

        if self.status == RunStatus::Pending {
            for (name, status) in &self.sections {
                if *status != SectionStatus::Pending {
                    problems.push(format!(
                        "section '{}' is {:?} but the run is still pending",
                        name, status
                    ));
                }
            }
        }

        if self.status == RunStatus::Completed {
            for (name, status) in &self.sections {
                if *status != SectionStatus::Completed {
                    problems.push(format!(
                        "run is completed but section '{}' is {:?}",
                        name, status
                    ));
                }
            }
        }

        let mut prev: Option<&DateTime<Utc>> = None;
        for cp in &self.checkpoints {
            if let Some(p) = prev {
                if cp.created_at < *p {
                    problems.push(format!(
                        "checkpoint '{}' is timestamped before its predecessor",
                        cp.name
                    ));
                }
            }
            prev = Some(&cp.created_at);
        }

        problems
    }
}

/// A merge-write against a run record. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateWriteRequest {
    /// New current step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// New current section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// New run status (must be a valid forward transition).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    /// Section statuses to merge by key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, SectionStatus>,
    /// Error entries to append.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

impl StateWriteRequest {
    /// Set the current step.
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Set the current section.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Set the run status.
    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Merge one section status.
    pub fn section_status(mut self, name: impl Into<String>, status: SectionStatus) -> Self {
        self.sections.insert(name.into(), status);
        self
    }

    /// Append one error entry.
    pub fn error(mut self, entry: ErrorEntry) -> Self {
        self.errors.push(entry);
        self
    }
}

/// Health of a persisted run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "health", rename_all = "snake_case")]
pub enum StoreHealth {
    /// Parseable and internally consistent.
    Valid,
    /// Parseable but inconsistent; may be repairable.
    Invalid { problems: Vec<String> },
    /// Unparseable; unrecoverable without a checkpoint.
    Corrupted { detail: String },
}
