//! Axum route handlers for the scoring task API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::{ApiJson, AppError};
use crate::models::candidate::ScoringRequest;
use crate::models::task::Task;
use crate::state::AppState;
use crate::tasks::orchestrator;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// POST /score
///
/// Accepts a scoring request and returns 202 with the task id immediately;
/// scoring runs in the background. A fresh cached result for an identical
/// job description yields a task that is already COMPLETED.
pub async fn handle_submit(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ScoringRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    info!(
        "Received scoring request with {} candidates using model: {}",
        request.candidates.len(),
        request.model_provider
    );

    let task_id = orchestrator::submit(state.store.clone(), &state.llms, request).await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

/// GET /score/status/:task_id
///
/// Returns the full task record: status, progress message, and the result or
/// error detail once terminal.
pub async fn handle_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = orchestrator::get_status(&state.store, &task_id).await?;
    Ok(Json(task))
}

/// DELETE /score/task/:task_id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    orchestrator::delete_task(&state.store, &task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
