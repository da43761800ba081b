use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Provider credentials are opaque here; they are injected into the LLM
/// client adapters and used nowhere else.
#[derive(Debug, Clone)]
pub struct Config {
    /// Allowed CORS origins. Empty list (unset) falls back to permissive.
    pub allowed_origins: Vec<String>,
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub task_store_path: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            allowed_origins: parse_origins(
                &std::env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            task_store_path: std::env::var("TASK_STORE_PATH")
                .unwrap_or_else(|_| "tasks.json".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Splits a comma-separated origin list, trimming whitespace and dropping
/// empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins("http://localhost:3000, https://app.example.com ,");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn test_parse_origins_empty_input_is_empty_list() {
        assert!(parse_origins("").is_empty());
        assert!(parse_origins(" , ,").is_empty());
    }
}
