//! Task Orchestrator — submission with dedup caching, background execution,
//! status retrieval, and deletion.
//!
//! Submission validates the request, then scans the table for a COMPLETED
//! task with byte-identical job description text. A fresh match (within the
//! TTL) is copied into a new, immediately COMPLETED task; stale matches are
//! evicted as part of the same atomic unit and scoring runs from scratch.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{ChatModel, LlmRegistry};
use crate::models::candidate::ScoringRequest;
use crate::models::task::{Task, TaskStatus};
use crate::scoring::pipeline::score_candidates;
use crate::tasks::store::TaskStore;

/// How long a COMPLETED result may be reused for an identical job description.
const CACHE_TTL_MINUTES: i64 = 10;

enum Submission {
    /// Fresh cache hit — the new task was created already COMPLETED.
    Reused { source_task_id: String },
    /// Cache miss (or stale eviction) — background scoring required.
    Scheduled,
}

/// Validates the request, creates a task, and either reuses a fresh cached
/// result or schedules background scoring. Returns the new task id either way.
pub async fn submit(
    store: Arc<TaskStore>,
    llms: &LlmRegistry,
    request: ScoringRequest,
) -> Result<String, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    let model = llms.resolve(&request.model_provider).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported model provider: {}",
            request.model_provider
        ))
    })?;

    let task_id = Uuid::new_v4().to_string();

    match plan_submission(&store, &task_id, &request.job_description).await {
        Submission::Reused { source_task_id } => {
            info!("Task {task_id} reused cached result from task {source_task_id}");
        }
        Submission::Scheduled => {
            info!(
                "Task {task_id} created, scheduling scoring of {} candidates with {}",
                request.candidates.len(),
                request.model_provider
            );
            let store = store.clone();
            let id = task_id.clone();
            tokio::spawn(async move {
                run_scoring(store, model, id, request).await;
            });
        }
    }

    Ok(task_id)
}

/// One atomic load-modify-save unit: scan for cached COMPLETED tasks with
/// byte-identical job description text, evict anything past the TTL, and
/// insert the new task record.
async fn plan_submission(store: &TaskStore, task_id: &str, job_description: &str) -> Submission {
    let now = Utc::now();
    let ttl = Duration::minutes(CACHE_TTL_MINUTES);
    let task_id = task_id.to_string();
    let job_description = job_description.to_string();

    store
        .transact(move |table| {
            let completed: Vec<Task> = table
                .values()
                .filter(|t| {
                    t.status == TaskStatus::Completed && t.job_description == job_description
                })
                .cloned()
                .collect();

            // Freshest usable hit wins; a match without a result is an
            // inconsistent record and falls through to a normal miss.
            let hit = completed
                .iter()
                .filter(|t| now - t.created_at <= ttl && t.result.is_some())
                .max_by_key(|t| t.created_at)
                .cloned();

            for stale in completed.iter().filter(|t| now - t.created_at > ttl) {
                info!("Evicting stale cached task {}", stale.task_id);
                table.remove(&stale.task_id);
            }

            match hit {
                Some(source) => {
                    let task = Task {
                        task_id: task_id.clone(),
                        status: TaskStatus::Completed,
                        job_description,
                        created_at: now,
                        message: format!(
                            "Result reused from completed task {}",
                            source.task_id
                        ),
                        result: source.result.clone(),
                        error_detail: None,
                    };
                    table.insert(task_id, task);
                    Submission::Reused {
                        source_task_id: source.task_id,
                    }
                }
                None => {
                    let task = Task::new_pending(task_id.clone(), job_description, now);
                    table.insert(task_id, task);
                    Submission::Scheduled
                }
            }
        })
        .await
}

/// Background execution path: PROCESSING → progress message updates →
/// COMPLETED with the aggregated result, or FAILED if the scoring future is
/// lost to a panic before producing one.
async fn run_scoring(
    store: Arc<TaskStore>,
    model: Arc<dyn ChatModel>,
    task_id: String,
    request: ScoringRequest,
) {
    if let Err(e) = store
        .update_status(&task_id, TaskStatus::Processing, Some("Scoring started"), None, None)
        .await
    {
        error!("Task {task_id}: could not enter PROCESSING: {e}");
        return;
    }

    // Progress flows over a channel; the receiver mirrors each message into
    // the task record while the status stays PROCESSING.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let progress_store = store.clone();
    let progress_task_id = task_id.clone();
    let progress = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = progress_store
                .update_status(
                    &progress_task_id,
                    TaskStatus::Processing,
                    Some(&message),
                    None,
                    None,
                )
                .await
            {
                warn!("Task {progress_task_id}: progress update dropped: {e}");
            }
        }
    });

    let scoring = tokio::spawn(async move {
        score_candidates(
            model.as_ref(),
            &request.job_description,
            &request.candidates,
            Some(&tx),
        )
        .await
    });

    let outcome = scoring.await;
    // The sender is owned by the scoring future; once it resolves, the
    // receiver drains the remaining messages and exits.
    let _ = progress.await;

    match outcome {
        Ok(result) => {
            let summary = format!(
                "Scoring complete: {} candidates scored, {} batch errors",
                result.scored_candidates.len(),
                result.errors.len()
            );
            if let Err(e) = store
                .update_status(&task_id, TaskStatus::Completed, Some(&summary), Some(result), None)
                .await
            {
                error!("Task {task_id}: could not record completion: {e}");
            }
        }
        Err(e) => {
            error!("Task {task_id}: scoring aborted unexpectedly: {e}");
            let detail = format!("Scoring aborted unexpectedly: {e}");
            if let Err(e) = store
                .update_status(
                    &task_id,
                    TaskStatus::Failed,
                    Some("Scoring failed"),
                    None,
                    Some(&detail),
                )
                .await
            {
                error!("Task {task_id}: could not record failure: {e}");
            }
        }
    }
}

/// Reloads the store and returns the task, observing updates made by the
/// background path.
pub async fn get_status(store: &TaskStore, task_id: &str) -> Result<Task, AppError> {
    store
        .get(task_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))
}

/// Removes the task if present. Repeated deletes after the first report
/// "not found", which callers must tolerate.
pub async fn delete_task(store: &TaskStore, task_id: &str) -> Result<(), AppError> {
    if store.delete(task_id).await {
        info!("Task {task_id} deleted");
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Task {task_id} not found")))
    }
}
