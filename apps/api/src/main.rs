mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tasks::store::TaskStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Candidate Scoring API v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(TaskStore::new(&config.task_store_path));
    info!(
        "Task store at {} ({} tasks)",
        config.task_store_path,
        store.snapshot().await.len()
    );

    let llms = Arc::new(LlmRegistry::from_config(&config));
    info!("LLM providers registered: openai, gemini");

    let state = AppState { store, llms };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS policy from the configured origin list; an empty list (dev) falls
/// back to permissive.
fn build_cors(config: &Config) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
