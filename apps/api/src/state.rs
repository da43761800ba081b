use std::sync::Arc;

use crate::llm_client::LlmRegistry;
use crate::tasks::store::TaskStore;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub llms: Arc<LlmRegistry>,
}
