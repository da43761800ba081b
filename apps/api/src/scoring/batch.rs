//! Batch Scorer — the two-attempt parse strategy.
//!
//! Attempt 1 renders the strict prompt and parses the raw output directly as
//! a JSON list of `ScoredCandidate`. On parse failure only, attempt 2 renders
//! the lenient prompt and locates a JSON array inside whatever prose or
//! markdown fencing surrounds it; the extracted array is still validated
//! against the `ScoredCandidate` schema. A second parse failure, or a
//! transport failure at any point, fails the batch — there is no third try.

use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::ChatModel;
use crate::models::candidate::{Candidate, ScoredCandidate};
use crate::scoring::invoker::{invoke_with_retry, InvocationExhausted};
use crate::scoring::prompts::{
    format_candidates_for_prompt, lenient_system_instruction, render_retry_prompt,
    render_strict_prompt, SYSTEM_INSTRUCTION,
};

/// Candidates per LLM invocation unit. The last batch may be smaller.
pub const BATCH_SIZE: usize = 10;

/// How much raw model output is carried into an error message.
const RAW_PREVIEW_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{0}")]
    Invoke(#[from] InvocationExhausted),

    #[error("unparseable model output after lenient retry. Content: {preview}")]
    Unparseable { preview: String },
}

/// Scores one batch of candidates. Range checks on `score` live in the
/// `ScoredCandidate` deserializer; an out-of-range value is a parse failure
/// here, never a clamp.
pub async fn score_batch(
    model: &dyn ChatModel,
    job_description: &str,
    batch: &[Candidate],
) -> Result<Vec<ScoredCandidate>, BatchError> {
    let candidates_json = format_candidates_for_prompt(batch);

    info!(
        "Scoring batch of {} candidates (attempt 1 - strict JSON)",
        batch.len()
    );
    let strict_prompt = render_strict_prompt(job_description, &candidates_json);
    let raw = invoke_with_retry(model, SYSTEM_INSTRUCTION, &strict_prompt).await?;

    match parse_strict(&raw) {
        Ok(scored) => {
            info!("Parsed strict JSON output on first attempt");
            return Ok(scored);
        }
        Err(e) => warn!("Strict parse failed, retrying with lenient prompt: {e}"),
    }

    info!(
        "Scoring batch of {} candidates (attempt 2 - lenient output)",
        batch.len()
    );
    let retry_prompt = render_retry_prompt(job_description, &candidates_json);
    let raw = invoke_with_retry(model, &lenient_system_instruction(), &retry_prompt).await?;

    match parse_lenient(&raw) {
        Some(scored) => {
            info!("Parsed JSON from lenient retry attempt");
            Ok(scored)
        }
        None => Err(BatchError::Unparseable {
            preview: preview(&raw),
        }),
    }
}

fn parse_strict(raw: &str) -> Result<Vec<ScoredCandidate>, serde_json::Error> {
    serde_json::from_str(raw.trim())
}

/// Locates a JSON array inside surrounding prose or code fencing and
/// validates it against the `ScoredCandidate` schema. Validation failure is
/// treated the same as a parse failure.
fn parse_lenient(raw: &str) -> Option<Vec<ScoredCandidate>> {
    let text = strip_json_fences(raw);
    if let Ok(scored) = serde_json::from_str(text) {
        return Some(scored);
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(RAW_PREVIEW_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    fn candidates(ids: &[&str]) -> Vec<Candidate> {
        ids.iter()
            .map(|id| Candidate {
                id: id.to_string(),
                name: format!("Candidate {id}"),
                job_title: None,
                headline: None,
                summary: None,
                keywords: None,
                educations: None,
                experiences: None,
                skills: None,
            })
            .collect()
    }

    const VALID_BATCH_JSON: &str = r#"[
        {"id": "c1", "name": "Candidate c1", "score": 90, "highlights": ["Strong match"]},
        {"id": "c2", "name": "Candidate c2", "score": 40, "highlights": ["Weak match"]}
    ]"#;

    #[tokio::test]
    async fn test_strict_success_invokes_exactly_once() {
        let model = ScriptedModel::new(vec![Ok(VALID_BATCH_JSON)]);
        let scored = score_batch(&model, "Backend Engineer", &candidates(&["c1", "c2"]))
            .await
            .unwrap();
        assert_eq!(model.call_count(), 1);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].id, "c1");
        assert_eq!(scored[0].score, 90);
    }

    #[tokio::test]
    async fn test_fenced_output_falls_back_to_lenient_attempt() {
        let fenced = "```json\n[{\"id\": \"c1\", \"name\": \"Candidate c1\", \"score\": 75, \"highlights\": [\"ok\"]}]\n```";
        let prose = "Sure! Here are the results:\n[{\"id\": \"c1\", \"name\": \"Candidate c1\", \"score\": 75, \"highlights\": [\"ok\"]}]\nHope that helps.";
        let model = ScriptedModel::new(vec![Ok(fenced), Ok(prose)]);

        let scored = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap();
        assert_eq!(model.call_count(), 2);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 75);
    }

    #[tokio::test]
    async fn test_both_attempts_unparseable_fails_the_batch() {
        let model = ScriptedModel::new(vec![
            Ok("I cannot produce JSON right now."),
            Ok("Still no JSON, sorry."),
        ]);
        let err = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap_err();
        assert_eq!(model.call_count(), 2);
        assert!(matches!(err, BatchError::Unparseable { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_parse_failures() {
        // Attempt 1 scores above the range, attempt 2 below it; neither is
        // clamped or passed through, so the batch fails.
        let over = r#"[{"id": "c1", "name": "Candidate c1", "score": 150, "highlights": ["x"]}]"#;
        let under = r#"[{"id": "c1", "name": "Candidate c1", "score": -5, "highlights": ["x"]}]"#;
        let model = ScriptedModel::new(vec![Ok(over), Ok(under)]);

        let err = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap_err();
        assert_eq!(model.call_count(), 2);
        assert!(matches!(err, BatchError::Unparseable { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_strict_output_falls_back_to_lenient() {
        let over = r#"[{"id": "c1", "name": "Candidate c1", "score": 101, "highlights": ["x"]}]"#;
        let valid = r#"[{"id": "c1", "name": "Candidate c1", "score": 100, "highlights": ["x"]}]"#;
        let model = ScriptedModel::new(vec![Ok(over), Ok(valid)]);

        let scored = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap();
        assert_eq!(model.call_count(), 2);
        assert_eq!(scored[0].score, 100);
    }

    #[tokio::test]
    async fn test_lenient_output_is_still_schema_validated() {
        // Attempt 2 yields a JSON array of the wrong shape — treated as a
        // parse failure, not silently passed through.
        let model = ScriptedModel::new(vec![
            Ok("not json"),
            Ok(r#"Here you go: [{"candidate": "c1", "rating": "high"}]"#),
        ]);
        let err = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Unparseable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_exhaustion_is_not_a_parse_retry() {
        let model = ScriptedModel::new(vec![Err("down"), Err("down"), Err("down")]);
        let err = score_batch(&model, "Backend Engineer", &candidates(&["c1"]))
            .await
            .unwrap_err();
        // Three transport attempts, no lenient attempt afterwards.
        assert_eq!(model.call_count(), 3);
        assert!(matches!(err, BatchError::Invoke(_)));
        assert!(err.to_string().contains("invocation exhausted"));
    }

    #[test]
    fn test_parse_lenient_handles_fences_and_prose() {
        let fenced = "```json\n[{\"id\": \"c1\", \"name\": \"A\", \"score\": 10, \"highlights\": [\"x\"]}]\n```";
        assert_eq!(parse_lenient(fenced).unwrap().len(), 1);

        let prose = "Results below.\n[{\"id\": \"c1\", \"name\": \"A\", \"score\": 10, \"highlights\": [\"x\"]}]\nDone.";
        assert_eq!(parse_lenient(prose).unwrap().len(), 1);

        assert!(parse_lenient("no array here").is_none());
    }

    #[test]
    fn test_strip_json_fences_variants() {
        assert_eq!(
            strip_json_fences("```json\n[1]\n```"),
            "[1]"
        );
        assert_eq!(strip_json_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_json_fences("[1]"), "[1]");
    }
}
