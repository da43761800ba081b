//! LLM provider adapters — the single seam between the scoring core and the
//! provider HTTP APIs.
//!
//! ARCHITECTURAL RULE: no other module may talk to a provider directly. The
//! core consumes only `ChatModel::complete(system, prompt) -> text`. Retry
//! policy lives one layer up in `scoring::invoker`; each adapter makes exactly
//! one HTTP request per call and surfaces every failure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Models are intentionally hardcoded per provider to prevent drift.
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One completion request against a named provider. Asynchronous, raises on
/// any transport or provider failure.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

/// Adapter for the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = OpenAiRequest {
            model: OPENAI_MODEL,
            temperature: 0.0,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: system,
                },
                OpenAiMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OpenAiResponse = response.json().await?;
        debug!("OpenAI call succeeded ({} choices)", parsed.choices.len());

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Adapter for the Gemini generateContent API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart { text: system }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig { temperature: 0.0 },
        };

        let url = format!(
            "{GEMINI_API_BASE}/{GEMINI_MODEL}:generateContent?key={}",
            self.api_key
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        debug!(
            "Gemini call succeeded ({} candidates)",
            parsed.candidates.len()
        );

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// Maps the closed set of provider names to their adapters.
pub struct LlmRegistry {
    providers: HashMap<String, Arc<dyn ChatModel>>,
}

impl LlmRegistry {
    pub fn from_config(config: &Config) -> Self {
        let mut providers: HashMap<String, Arc<dyn ChatModel>> = HashMap::new();
        providers.insert(
            "openai".to_string(),
            Arc::new(OpenAiClient::new(config.openai_api_key.clone())),
        );
        providers.insert(
            "gemini".to_string(),
            Arc::new(GeminiClient::new(config.gemini_api_key.clone())),
        );
        Self { providers }
    }

    /// Resolves a provider name; `None` means the name is not supported.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ChatModel>> {
        self.providers.get(name).cloned()
    }

    #[cfg(test)]
    pub(crate) fn single(name: &str, model: Arc<dyn ChatModel>) -> Self {
        let mut providers = HashMap::new();
        providers.insert(name.to_string(), model);
        Self { providers }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles
// ────────────────────────────────────────────────────────────────────────────
