//! Task Store — a single JSON file mirroring an in-memory task table.
//!
//! Every operation is one load-modify-save unit executed under a mutex, so
//! concurrent submissions, status polls, and background completions cannot
//! interleave partial table states. A corrupted or missing file degrades to
//! an empty table with a warning; a failed write is logged and the caller
//! continues, accepting that the mutation may be lost on restart.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::models::candidate::ScoringResult;
use crate::models::task::{Task, TaskStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("illegal status transition {from:?} -> {to:?} for task {task_id}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

pub struct TaskStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Runs `f` against the full task table as one atomic load-modify-save
    /// unit.
    pub async fn transact<R>(&self, f: impl FnOnce(&mut HashMap<String, Task>) -> R) -> R {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await;
        let out = f(&mut table);
        self.write_table(&table).await;
        out
    }

    /// Reloads from disk and returns a copy of the table.
    pub async fn snapshot(&self) -> HashMap<String, Task> {
        let _guard = self.lock.lock().await;
        self.read_table().await
    }

    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.snapshot().await.remove(task_id)
    }

    pub async fn insert(&self, task: Task) {
        self.transact(|table| {
            table.insert(task.task_id.clone(), task);
        })
        .await;
    }

    /// Removes a task if present. Absent ids report `false` every time;
    /// callers surface that as "not found", including on repeated deletes.
    pub async fn delete(&self, task_id: &str) -> bool {
        self.transact(|table| table.remove(task_id).is_some()).await
    }

    /// Mutates an existing record. An absent id is a warning and a no-op,
    /// never an implicit create. `result` / `error_detail` are only ever set
    /// by calls that provide them, not cleared by calls that omit them.
    /// Non-forward transitions are rejected.
    pub async fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: Option<&str>,
        result: Option<ScoringResult>,
        error_detail: Option<&str>,
    ) -> Result<(), StoreError> {
        self.transact(|table| {
            let Some(task) = table.get_mut(task_id) else {
                warn!("update_status for unknown task {task_id} ignored");
                return Ok(());
            };

            if !task.status.can_transition_to(status) {
                return Err(StoreError::InvalidTransition {
                    task_id: task_id.to_string(),
                    from: task.status,
                    to: status,
                });
            }

            task.status = status;
            if let Some(message) = message {
                task.message = message.to_string();
            }
            if let Some(result) = result {
                task.result = Some(result);
            }
            if let Some(detail) = error_detail {
                task.error_detail = Some(detail.to_string());
            }
            Ok(())
        })
        .await
    }

    async fn read_table(&self) -> HashMap<String, Task> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("failed to read task store {}: {e}", self.path.display());
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    "task store {} is corrupted, starting from an empty table: {e}",
                    self.path.display()
                );
                HashMap::new()
            }
        }
    }

    async fn write_table(&self, table: &HashMap<String, Task>) {
        let json = match serde_json::to_vec_pretty(table) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize task table: {e}");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&self.path, json).await {
            error!("failed to persist task store {}: {e}", self.path.display());
        }
    }
}
