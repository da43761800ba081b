pub mod health;
pub mod score;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/score", post(score::handle_submit))
        .route("/score/status/:task_id", get(score::handle_status))
        .route("/score/task/:task_id", delete(score::handle_delete))
        .with_state(state)
}
