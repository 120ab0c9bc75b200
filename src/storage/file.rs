//! File-backed run-state storage.
//!
//! Runs are stored as JSON files in `<lectern_home>/runs/`. Writes are
//! atomic via the temp-file + rename pattern, so a crash mid-write never
//! leaves a half-written record for the next reader. One transient write
//! fault is retried with a short backoff, then surfaced.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::runs_dir;
use crate::core::{Checkpoint, PipelineState, StateWriteRequest, StoreHealth};
use crate::error::{LecternError, Result};
use crate::storage::StateStore;
use crate::util::read_to_string_limited;

/// Backoff before the single write retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// File-backed state store.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    /// Directory where run files are stored.
    runs_dir: PathBuf,
    /// Serializes read-modify-write cycles (single-writer discipline).
    write_lock: Arc<Mutex<()>>,
}

impl FileStateStore {
    /// Create a store over the default runs directory.
    pub fn new() -> Result<Self> {
        let dir = runs_dir().ok_or_else(|| {
            LecternError::config("could not determine runs directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store over a custom directory.
    pub fn with_dir(runs_dir: impl Into<PathBuf>) -> Result<Self> {
        let runs_dir = runs_dir.into();

        if !runs_dir.exists() {
            fs::create_dir_all(&runs_dir).map_err(|e| LecternError::storage(&runs_dir, e))?;
        }

        Ok(Self {
            runs_dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Path of a run's record file.
    fn run_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(format!("{}.json", run_id))
    }

    /// Path of the temp file used during atomic writes.
    fn temp_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(format!(".{}.json.tmp", run_id))
    }

    /// Path of an independently loadable checkpoint record.
    ///
    /// Checkpoints live outside the run file so they survive corruption
    /// of the live record.
    fn checkpoint_path(&self, run_id: &str, name: &str) -> PathBuf {
        self.runs_dir
            .join(format!("{}.{}.checkpoint.json", run_id, name))
    }

    /// Persist one checkpoint record atomically.
    fn write_checkpoint_file(&self, run_id: &str, checkpoint: &Checkpoint) -> Result<()> {
        let final_path = self.checkpoint_path(run_id, &checkpoint.name);
        let temp_path = self
            .runs_dir
            .join(format!(".{}.{}.checkpoint.tmp", run_id, checkpoint.name));

        let json = serde_json::to_string_pretty(checkpoint)?;

        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| LecternError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| LecternError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| LecternError::storage(&temp_path, e))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| LecternError::storage(&final_path, e))?;
        Ok(())
    }

    /// Load one checkpoint record from its independent file.
    fn load_checkpoint_file(&self, run_id: &str, name: &str) -> Result<Option<Checkpoint>> {
        let path = self.checkpoint_path(run_id, name);
        if !path.exists() {
            return Ok(None);
        }

        let content = read_to_string_limited(&path)?;
        match serde_json::from_str::<Checkpoint>(&content) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => Err(LecternError::corrupted(run_id, e.to_string())),
        }
    }

    /// One atomic write attempt: temp file, sync, rename.
    fn atomic_write_once(&self, state: &PipelineState) -> Result<()> {
        let final_path = self.run_path(&state.run_id);
        let temp_path = self.temp_path(&state.run_id);

        let json = serde_json::to_string_pretty(state)?;

        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| LecternError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| LecternError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| LecternError::storage(&temp_path, e))?;
        }

        // Rename is atomic on POSIX: readers see the old or new record
        fs::rename(&temp_path, &final_path).map_err(|e| LecternError::storage(&final_path, e))?;

        Ok(())
    }

    /// Atomic write with a single bounded retry on storage faults.
    fn atomic_write(&self, state: &PipelineState) -> Result<()> {
        match self.atomic_write_once(state) {
            Ok(()) => Ok(()),
            Err(LecternError::Storage { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "state write failed, retrying once"
                );
                std::thread::sleep(RETRY_BACKOFF);
                self.atomic_write_once(state)
            }
            Err(other) => Err(other),
        }
    }

    /// Load and parse the raw record, distinguishing corruption.
    fn load_checked(&self, run_id: &str) -> Result<Option<PipelineState>> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = read_to_string_limited(&path)?;
        match serde_json::from_str::<PipelineState>(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => Err(LecternError::corrupted(run_id, e.to_string())),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self, run_id: &str) -> Result<Option<PipelineState>> {
        self.load_checked(run_id)
    }

    fn read(&self, run_id: &str) -> Result<PipelineState> {
        Ok(self
            .load_checked(run_id)?
            .unwrap_or_else(|| PipelineState::new(run_id)))
    }

    fn write(&self, run_id: &str, updates: StateWriteRequest) -> Result<PipelineState> {
        let _guard = self.write_lock.lock().expect("state write lock poisoned");

        let mut state = self
            .load_checked(run_id)?
            .unwrap_or_else(|| PipelineState::new(run_id));
        state.apply(updates)?;
        self.atomic_write(&state)?;
        Ok(state)
    }

    fn checkpoint(&self, run_id: &str, name: &str) -> Result<PipelineState> {
        let _guard = self.write_lock.lock().expect("state write lock poisoned");

        let mut state = self
            .load_checked(run_id)?
            .ok_or_else(|| LecternError::run_not_found(run_id))?;
        state.checkpoint(name)?;

        let checkpoint = state
            .find_checkpoint(name)
            .ok_or_else(|| LecternError::invalid_state("checkpoint vanished after creation"))?
            .clone();
        self.write_checkpoint_file(run_id, &checkpoint)?;

        self.atomic_write(&state)?;
        Ok(state)
    }

    fn recover(&self, run_id: &str, name: &str) -> Result<PipelineState> {
        let _guard = self.write_lock.lock().expect("state write lock poisoned");

        // A corrupted live record is exactly what checkpoints exist for:
        // fall back to the independent checkpoint file.
        let (live, checkpoint) = match self.load_checked(run_id) {
            Ok(Some(state)) => {
                let checkpoint = match state.find_checkpoint(name).cloned() {
                    Some(checkpoint) => checkpoint,
                    None => self
                        .load_checkpoint_file(run_id, name)?
                        .ok_or_else(|| LecternError::checkpoint_not_found(run_id, name))?,
                };
                (Some(state), checkpoint)
            }
            Ok(None) => return Err(LecternError::run_not_found(run_id)),
            Err(corruption) => {
                tracing::warn!(
                    run_id,
                    error = %corruption,
                    "live record corrupted, recovering from checkpoint file"
                );
                let checkpoint = self
                    .load_checkpoint_file(run_id, name)?
                    .ok_or(corruption)?;
                (None, checkpoint)
            }
        };

        let problems = checkpoint.snapshot.consistency_problems();
        if !problems.is_empty() {
            return Err(LecternError::invalid_state(format!(
                "checkpoint '{}' is not consistent: {}",
                name,
                problems.join("; ")
            )));
        }

        let mut state = match live {
            Some(state) => state,
            None => {
                // Rebuild from the snapshot; re-register the checkpoint so
                // it stays usable on the fresh record.
                let mut state = (*checkpoint.snapshot).clone();
                if state.find_checkpoint(name).is_none() {
                    state.checkpoints.push(checkpoint.clone());
                }
                state
            }
        };

        state.restore_from(&checkpoint);
        self.atomic_write(&state)?;
        Ok(state)
    }

    fn validate(&self, run_id: &str) -> Result<StoreHealth> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Ok(StoreHealth::Valid);
        }

        let content = read_to_string_limited(&path)?;
        let state = match serde_json::from_str::<PipelineState>(&content) {
            Ok(state) => state,
            Err(e) => {
                return Ok(StoreHealth::Corrupted {
                    detail: e.to_string(),
                })
            }
        };

        let problems = state.consistency_problems();
        if problems.is_empty() {
            Ok(StoreHealth::Valid)
        } else {
            Ok(StoreHealth::Invalid { problems })
        }
    }

    fn list(&self, limit: usize) -> Result<Vec<PipelineState>> {
        if !self.runs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs: Vec<PipelineState> = Vec::new();

        let entries =
            fs::read_dir(&self.runs_dir).map_err(|e| LecternError::storage(&self.runs_dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| LecternError::storage(&self.runs_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files, in-flight temp files, and checkpoints
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if file_name.is_empty()
                || file_name.starts_with('.')
                || file_name.ends_with(".checkpoint.json")
            {
                continue;
            }

            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(state) = serde_json::from_str::<PipelineState>(&content) {
                    runs.push(state);
                }
            }
        }

        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        runs.truncate(limit);

        Ok(runs)
    }

    fn delete(&self, run_id: &str) -> Result<()> {
        let path = self.run_path(run_id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| LecternError::storage(&path, e))?;
        }

        let temp_path = self.temp_path(run_id);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        // Sweep the run's checkpoint files too
        if let Ok(entries) = fs::read_dir(&self.runs_dir) {
            let prefix = format!("{}.", run_id);
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with(&prefix) && name.ends_with(".checkpoint.json") {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }

        Ok(())
    }
}
