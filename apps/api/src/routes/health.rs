use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::models::task::TaskStatus;
use crate::state::AppState;

/// GET /health
/// Liveness plus task-table counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let table = state.store.snapshot().await;
    let processing = table
        .values()
        .filter(|t| t.status == TaskStatus::Processing)
        .count();

    Json(json!({
        "status": "ok",
        "total_tasks": table.len(),
        "processing_tasks": processing,
    }))
}
