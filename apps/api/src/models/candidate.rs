//! Wire-level models for scoring requests and results.

use serde::{Deserialize, Serialize};

/// A candidate profile as produced by the upstream preprocessor.
/// Immutable once received; only `id` and `name` are required, everything
/// else is free text that may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(rename = "jobTitle", default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub educations: Option<String>,
    #[serde(default)]
    pub experiences: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
}

/// A candidate with the score and highlights assigned by the LLM.
///
/// `score` must be in [0,100]; the range is enforced here at
/// deserialization, so out-of-range model output is a parse failure rather
/// than a clamped value. The batch scorer never adjusts what validation lets
/// through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: i64,
    pub highlights: Vec<String>,
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let score = i64::deserialize(deserializer)?;
    if !(0..=100).contains(&score) {
        return Err(serde::de::Error::custom(format!(
            "score {score} is outside the allowed range [0, 100]"
        )));
    }
    Ok(score)
}

/// Request body for `POST /score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub job_description: String,
    pub candidates: Vec<Candidate>,
    /// One of the registered provider names ("openai" or "gemini").
    #[serde(default = "default_provider")]
    pub model_provider: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

/// Terminal output of a scoring run: scored candidates plus one error string
/// per failed batch, both insertion-ordered. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub scored_candidates: Vec<ScoredCandidate>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_deserializes_with_only_required_fields() {
        let json = r#"{"id": "c1", "name": "A"}"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.id, "c1");
        assert!(candidate.job_title.is_none());
        assert!(candidate.skills.is_none());
    }

    #[test]
    fn test_candidate_job_title_uses_camel_case_wire_name() {
        let json = r#"{"id": "c1", "name": "A", "jobTitle": "Engineer"}"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.job_title.as_deref(), Some("Engineer"));

        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["jobTitle"], "Engineer");
    }

    #[test]
    fn test_scored_candidate_accepts_boundary_scores() {
        for score in [0, 100] {
            let json = format!(
                r#"{{"id": "c1", "name": "A", "score": {score}, "highlights": ["x"]}}"#
            );
            let scored: ScoredCandidate = serde_json::from_str(&json).unwrap();
            assert_eq!(scored.score, score);
        }
    }

    #[test]
    fn test_scored_candidate_rejects_out_of_range_scores() {
        for score in [-5, 101, 150] {
            let json = format!(
                r#"{{"id": "c1", "name": "A", "score": {score}, "highlights": ["x"]}}"#
            );
            let err = serde_json::from_str::<ScoredCandidate>(&json).unwrap_err();
            assert!(err.to_string().contains("[0, 100]"), "{err}");
        }
    }

    #[test]
    fn test_scoring_request_provider_defaults_to_openai() {
        let json = r#"{"job_description": "Backend Engineer", "candidates": []}"#;
        let request: ScoringRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.model_provider, "openai");
    }

    #[test]
    fn test_scoring_result_errors_default_to_empty() {
        let json = r#"{"scored_candidates": []}"#;
        let result: ScoringResult = serde_json::from_str(json).unwrap();
        assert!(result.errors.is_empty());
    }
}
