//! Prompt construction for candidate scoring.
//!
//! Two variants per batch: a strict prompt demanding a bare JSON list, and a
//! lenient retry variant (same instructions minus the STRICTLY qualifier)
//! used after the strict output fails to parse. A fixed few-shot example is
//! prepended to steer formatting; it is static content, never derived from
//! request data.

use serde::Serialize;

use crate::models::candidate::Candidate;

/// System instruction for the strict first attempt.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert recruitment assistant. Your task is to evaluate candidate profiles based on a provided job description.
Score each candidate on a scale of 0 to 100, where 100 represents a perfect match.
Provide a concise list of 2-3 bullet points as 'highlights', explaining the key reasons for the score, focusing on the candidate's alignment with the job description's requirements (skills, experience, qualifications).
Format your response STRICTLY as a JSON list, where each element is a JSON object containing 'id', 'name', 'score', and 'highlights' for each candidate provided. Do not include any introductory text, closing remarks, or markdown formatting outside the JSON structure.";

/// System instruction for the lenient retry — the STRICTLY qualifier removed.
pub fn lenient_system_instruction() -> String {
    SYSTEM_INSTRUCTION.replace("STRICTLY ", "")
}

/// Static few-shot example prepended to the strict prompt.
const FEW_SHOT_EXAMPLE: &str = r#"Example evaluation.

Job Description:
---
Software Engineer - Backend (Python, Django, AWS)
---

Candidate Profiles (Format: JSON list):
---
[
  {
    "id": "c1",
    "name": "Jane Doe",
    "summary": "Experienced Python developer with 5 years in backend systems. Proficient in Django and Flask. Deployed applications on AWS.",
    "skills": "Python, Django, Flask, AWS, PostgreSQL"
  },
  {
    "id": "c2",
    "name": "John Smith",
    "summary": "Frontend developer focused on React and Vue. Some experience with Node.js.",
    "skills": "JavaScript, React, Vue, HTML, CSS"
  }
]
---

Expected output:
[
  {
    "id": "c1",
    "name": "Jane Doe",
    "score": 90,
    "highlights": [
      "Strong Python and Django experience directly relevant to the role.",
      "Proven experience with AWS deployment.",
      "Backend focus aligns well with job requirements."
    ]
  },
  {
    "id": "c2",
    "name": "John Smith",
    "score": 30,
    "highlights": [
      "Primary experience is in frontend technologies (React, Vue).",
      "Lacks required backend Python/Django skills.",
      "No mention of AWS experience."
    ]
  }
]"#;

/// Strict human prompt. Replace `{job_description}` and `{candidates_json}`.
const SCORING_PROMPT_TEMPLATE: &str = r#"Job Description:
---
{job_description}
---

Candidate Profiles (Format: JSON list):
---
{candidates_json}
---

Evaluate the candidates based on the job description and provide the results STRICTLY in the specified JSON format list:
[
    {
        "id": "candidate_id",
        "name": "candidate_name",
        "score": <0-100>,
        "highlights": ["bullet point 1", "bullet point 2", ...]
    },
    ...
]"#;

/// Lenient human prompt for the retry attempt.
const RETRY_PROMPT_TEMPLATE: &str = r#"Job Description:
---
{job_description}
---

Candidate Profiles (Format: JSON list):
---
{candidates_json}
---

Please evaluate the candidates based on the job description. Provide the results as a JSON list of objects, each with 'id', 'name', 'score', and 'highlights'."#;

pub fn render_strict_prompt(job_description: &str, candidates_json: &str) -> String {
    let body = SCORING_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidates_json}", candidates_json);
    format!("{FEW_SHOT_EXAMPLE}\n\n{body}")
}

pub fn render_retry_prompt(job_description: &str, candidates_json: &str) -> String {
    RETRY_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidates_json}", candidates_json)
}

/// Prompt-facing projection of a candidate. Field order and explicit nulls
/// are deliberate: prompts must be stable and reproducible.
#[derive(Serialize)]
struct PromptCandidate<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "jobTitle")]
    job_title: Option<&'a str>,
    headline: Option<&'a str>,
    summary: Option<&'a str>,
    keywords: Option<&'a str>,
    educations: Option<&'a str>,
    experiences: Option<&'a str>,
    skills: Option<&'a str>,
}

/// Serializes a candidate batch for prompt interpolation: only the defined
/// fields, missing attributes as explicit `null`s.
pub fn format_candidates_for_prompt(candidates: &[Candidate]) -> String {
    let projected: Vec<PromptCandidate> = candidates
        .iter()
        .map(|c| PromptCandidate {
            id: &c.id,
            name: &c.name,
            job_title: c.job_title.as_deref(),
            headline: c.headline.as_deref(),
            summary: c.summary.as_deref(),
            keywords: c.keywords.as_deref(),
            educations: c.educations.as_deref(),
            experiences: c.experiences.as_deref(),
            skills: c.skills.as_deref(),
        })
        .collect();

    serde_json::to_string_pretty(&projected).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_candidate(id: &str, name: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            job_title: None,
            headline: None,
            summary: None,
            keywords: None,
            educations: None,
            experiences: None,
            skills: None,
        }
    }

    #[test]
    fn test_format_candidates_empty_list() {
        assert_eq!(format_candidates_for_prompt(&[]), "[]");
    }

    #[test]
    fn test_format_candidates_emits_explicit_nulls() {
        let json = format_candidates_for_prompt(&[minimal_candidate("c3", "Minimal User")]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], "c3");
        assert!(value[0]["jobTitle"].is_null());
        assert!(value[0]["skills"].is_null());
        // Nulls are present, not omitted.
        assert_eq!(value[0].as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_format_candidates_preserves_input_order() {
        let json = format_candidates_for_prompt(&[
            minimal_candidate("c1", "One"),
            minimal_candidate("c2", "Two"),
        ]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], "c1");
        assert_eq!(value[1]["id"], "c2");
    }

    #[test]
    fn test_lenient_system_drops_strictly_qualifier() {
        assert!(SYSTEM_INSTRUCTION.contains("STRICTLY"));
        assert!(!lenient_system_instruction().contains("STRICTLY"));
    }

    #[test]
    fn test_strict_prompt_interpolates_and_prepends_few_shot() {
        let prompt = render_strict_prompt("Backend Engineer", r#"[{"id": "c1"}]"#);
        assert!(prompt.starts_with("Example evaluation."));
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains(r#"[{"id": "c1"}]"#));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_retry_prompt_has_no_strictly_wording() {
        let prompt = render_retry_prompt("Backend Engineer", "[]");
        assert!(!prompt.contains("STRICTLY"));
        assert!(prompt.contains("Backend Engineer"));
    }
}
