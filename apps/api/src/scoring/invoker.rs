//! Bounded-retry wrapper around a single LLM invocation.
//!
//! Retries transport/provider failures only; parse failures are handled one
//! layer up by the batch scorer. The two retry layers are orthogonal and
//! compose: worst case 3 transport attempts × 2 parse attempts = 6 underlying
//! calls per batch.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::llm_client::{ChatModel, LlmError};

/// Total attempts per invocation (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Terminal failure after the transport retry ceiling is reached, carrying
/// the last underlying cause.
#[derive(Debug, Error)]
#[error("invocation exhausted after {attempts} attempts: {last_error}")]
pub struct InvocationExhausted {
    pub attempts: u32,
    #[source]
    pub last_error: LlmError,
}

/// Invokes the model, sleeping with exponential backoff between failed
/// attempts: 1s, 2s, ... capped at 10s.
pub async fn invoke_with_retry(
    model: &dyn ChatModel,
    system: &str,
    prompt: &str,
) -> Result<String, InvocationExhausted> {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match model.complete(system, prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if attempt >= MAX_ATTEMPTS => {
                return Err(InvocationExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
            Err(e) => {
                warn!(
                    "LLM invocation attempt {attempt}/{MAX_ATTEMPTS} failed: {e}; retrying after {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    #[tokio::test]
    async fn test_success_on_first_attempt_calls_once() {
        let model = ScriptedModel::new(vec![Ok("[]")]);
        let text = invoke_with_retry(&model, "sys", "prompt").await.unwrap();
        assert_eq!(text, "[]");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let model = ScriptedModel::new(vec![
            Err("rate limited"),
            Err("rate limited"),
            Ok("recovered"),
        ]);
        let text = invoke_with_retry(&model, "sys", "prompt").await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_three_attempts_keeps_last_cause() {
        let model = ScriptedModel::new(vec![
            Err("first"),
            Err("second"),
            Err("third"),
        ]);
        let err = invoke_with_retry(&model, "sys", "prompt").await.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(model.call_count(), 3);
        assert!(err.to_string().contains("invocation exhausted"));
        assert!(err.last_error.to_string().contains("third"));
    }
}
