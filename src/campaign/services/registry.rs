//! Process-wide registry of live campaign tasks and their background jobs.

use crate::campaign::domain::{CampaignTask, TaskId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

/// Errors returned by [`TaskRegistry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No live task has this identifier.
    #[error("task {0} is not registered")]
    NotFound(TaskId),

    /// A previous holder of the registry lock panicked.
    #[error("task registry lock poisoned: {0}")]
    Poisoned(String),
}

/// Live task snapshots keyed by task id, plus the join handle of each
/// campaign job.
///
/// Every mutation of a task runs under the write lock, so readers never
/// observe a status that disagrees with its counters or log. Entries are
/// never removed.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<TaskId, CampaignTask>>>,
    jobs: Arc<Mutex<HashMap<TaskId, JoinHandle<()>>>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task, replacing any entry with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn insert(&self, task: CampaignTask) -> Result<(), RegistryError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        tasks.insert(task.id().clone(), task);
        Ok(())
    }

    /// Returns a copy of one live task.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn snapshot(&self, task_id: &TaskId) -> Result<Option<CampaignTask>, RegistryError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        Ok(tasks.get(task_id).cloned())
    }

    /// Returns copies of every live task.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn snapshots(&self) -> Result<Vec<CampaignTask>, RegistryError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        Ok(tasks.values().cloned().collect())
    }

    /// Applies `mutation` to one task while holding the write lock.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown tasks and
    /// [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn update<R>(
        &self,
        task_id: &TaskId,
        mutation: impl FnOnce(&mut CampaignTask) -> R,
    ) -> Result<R, RegistryError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| RegistryError::NotFound(task_id.clone()))?;
        Ok(mutation(task))
    }

    /// Records the background job driving `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn attach_job(&self, task_id: TaskId, job: JoinHandle<()>) -> Result<(), RegistryError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        jobs.insert(task_id, job);
        Ok(())
    }

    /// Waits for the background job of `task_id` to finish.
    ///
    /// Returns `false` when no job is pending, for example because it was
    /// already awaited.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub async fn wait(&self, task_id: &TaskId) -> Result<bool, RegistryError> {
        let job = {
            let mut jobs = self
                .jobs
                .lock()
                .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
            jobs.remove(task_id)
        };
        let Some(job) = job else {
            return Ok(false);
        };
        if let Err(err) = job.await {
            warn!(task_id = %task_id, error = %err, "campaign job ended abnormally");
        }
        Ok(true)
    }
}
