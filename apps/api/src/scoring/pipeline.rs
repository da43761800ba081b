//! Aggregation across batches: sequential processing, per-batch failure
//! isolation, progress reporting over a channel.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::llm_client::ChatModel;
use crate::models::candidate::{Candidate, ScoringResult};
use crate::scoring::batch::{score_batch, BATCH_SIZE};

/// Scores all candidates in fixed consecutive batches of [`BATCH_SIZE`], in
/// input order and strictly sequentially — no parallel batches, which bounds
/// provider rate-limit exposure.
///
/// A failing batch contributes exactly one formatted error string (batch
/// number, candidate ids, failure cause) and never aborts its siblings.
/// Progress messages are published to `progress` before each batch starts; a
/// closed channel is ignored, so progress delivery can never abort scoring.
pub async fn score_candidates(
    model: &dyn ChatModel,
    job_description: &str,
    candidates: &[Candidate],
    progress: Option<&UnboundedSender<String>>,
) -> ScoringResult {
    let mut scored_candidates = Vec::new();
    let mut errors = Vec::new();
    let total_batches = candidates.len().div_ceil(BATCH_SIZE);

    for (index, batch) in candidates.chunks(BATCH_SIZE).enumerate() {
        let batch_num = index + 1;
        let progress_msg = format!(
            "Processing batch {batch_num} of {total_batches}... ({} candidates)",
            batch.len()
        );
        info!("{progress_msg}");
        if let Some(tx) = progress {
            let _ = tx.send(progress_msg);
        }

        match score_batch(model, job_description, batch).await {
            Ok(scored) => scored_candidates.extend(scored),
            Err(e) => {
                let batch_ids: Vec<&str> = batch.iter().map(|c| c.id.as_str()).collect();
                let error_msg =
                    format!("Failed to score batch {batch_num} (IDs: {batch_ids:?}): {e}");
                error!("{error_msg}");
                errors.push(error_msg);
            }
        }
    }

    ScoringResult {
        scored_candidates,
        errors,
    }
}
