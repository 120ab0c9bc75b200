//! In-memory state store for tests and embedding.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::core::{PipelineState, StateWriteRequest, StoreHealth};
use crate::error::{LecternError, Result};
use crate::storage::StateStore;

/// In-memory state store.
///
/// Shares its records across clones, mirroring how the file store shares
/// a directory. Records cannot be byte-corrupted here, so `validate`
/// never reports `Corrupted`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    records: Arc<Mutex<BTreeMap<String, PipelineState>>>,
}

impl MemoryStateStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, run_id: &str) -> Result<Option<PipelineState>> {
        let records = self.records.lock().expect("state lock poisoned");
        Ok(records.get(run_id).cloned())
    }

    fn read(&self, run_id: &str) -> Result<PipelineState> {
        Ok(self
            .load(run_id)?
            .unwrap_or_else(|| PipelineState::new(run_id)))
    }

    fn write(&self, run_id: &str, updates: StateWriteRequest) -> Result<PipelineState> {
        let mut records = self.records.lock().expect("state lock poisoned");
        let mut state = records
            .get(run_id)
            .cloned()
            .unwrap_or_else(|| PipelineState::new(run_id));
        state.apply(updates)?;
        records.insert(run_id.to_string(), state.clone());
        Ok(state)
    }

    fn checkpoint(&self, run_id: &str, name: &str) -> Result<PipelineState> {
        let mut records = self.records.lock().expect("state lock poisoned");
        let mut state = records
            .get(run_id)
            .cloned()
            .ok_or_else(|| LecternError::run_not_found(run_id))?;
        state.checkpoint(name)?;
        records.insert(run_id.to_string(), state.clone());
        Ok(state)
    }

    fn recover(&self, run_id: &str, name: &str) -> Result<PipelineState> {
        let mut records = self.records.lock().expect("state lock poisoned");
        let mut state = records
            .get(run_id)
            .cloned()
            .ok_or_else(|| LecternError::run_not_found(run_id))?;
        let checkpoint = state
            .find_checkpoint(name)
            .ok_or_else(|| LecternError::checkpoint_not_found(run_id, name))?
            .clone();

        let problems = checkpoint.snapshot.consistency_problems();
        if !problems.is_empty() {
            return Err(LecternError::invalid_state(format!(
                "checkpoint '{}' is not consistent: {}",
                name,
                problems.join("; ")
            )));
        }

        state.restore_from(&checkpoint);
        records.insert(run_id.to_string(), state.clone());
        Ok(state)
    }

    fn validate(&self, run_id: &str) -> Result<StoreHealth> {
        let records = self.records.lock().expect("state lock poisoned");
        match records.get(run_id) {
            None => Ok(StoreHealth::Valid),
            Some(state) => {
                let problems = state.consistency_problems();
                if problems.is_empty() {
                    Ok(StoreHealth::Valid)
                } else {
                    Ok(StoreHealth::Invalid { problems })
                }
            }
        }
    }

    fn list(&self, limit: usize) -> Result<Vec<PipelineState>> {
        let records = self.records.lock().expect("state lock poisoned");
        let mut runs: Vec<PipelineState> = records.values().cloned().collect();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        runs.truncate(limit);
        Ok(runs)
    }

    fn delete(&self, run_id: &str) -> Result<()> {
        let mut records = self.records.lock().expect("state lock poisoned");
        records.remove(run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_state_store_contract;

    #[test]
    fn test_memory_store_contract() {
        let store = MemoryStateStore::new();
        test_state_store_contract(&store);
    }

    #[test]
    fn test_clones_share_records() {
        let store = MemoryStateStore::new();
        let clone = store.clone();

        store.write("run-1", StateWriteRequest::default()).unwrap();
        assert!(clone.exists("run-1").unwrap());
    }
}
