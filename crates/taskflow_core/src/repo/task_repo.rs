//! Task list repository over a key-value store.
//!
//! # Responsibility
//! - Load and save the ordered task list as a JSON array.
//!
//! # Invariants
//! - The list is stored under `TASKS_KEY`; order is preserved exactly.
//! - Every decoded record passes `Task::validate()` or the load fails.

use super::kv_store::{KeyValueStore, StoreError, StoreResult};
use crate::model::task::Task;
use log::debug;

/// Storage key holding the serialized task list.
pub const TASKS_KEY: &str = "tasks";

/// Repository interface for whole-list task persistence.
pub trait TaskRepository {
    /// Returns the persisted list, or an empty list when nothing is stored.
    fn load_tasks(&self) -> StoreResult<Vec<Task>>;
    /// Replaces the persisted list.
    fn save_tasks(&self, tasks: &[Task]) -> StoreResult<()>;
}

/// Task repository that mirrors the list into a `KeyValueStore`.
pub struct KvTaskRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvTaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Gives access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> TaskRepository for KvTaskRepository<S> {
    fn load_tasks(&self) -> StoreResult<Vec<Task>> {
        let Some(raw) = self.store.get(TASKS_KEY)? else {
            debug!("event=tasks_load module=repo status=empty");
            return Ok(Vec::new());
        };

        let tasks: Vec<Task> =
            serde_json::from_str(&raw).map_err(|err| StoreError::InvalidData {
                key: TASKS_KEY.to_string(),
                message: err.to_string(),
            })?;
        debug!(
            "event=tasks_load module=repo status=ok count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn save_tasks(&self, tasks: &[Task]) -> StoreResult<()> {
        let raw = serde_json::to_string(tasks).map_err(StoreError::Encode)?;
        self.store.set(TASKS_KEY, &raw)?;
        debug!(
            "event=tasks_save module=repo status=ok count={}",
            tasks.len()
        );
        Ok(())
    }
}
