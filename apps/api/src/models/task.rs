//! Persisted task records and their status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::candidate::ScoringResult;

/// Lifecycle of an asynchronous scoring task.
///
/// Transitions are strictly forward: PENDING → PROCESSING → {COMPLETED, FAILED}.
/// Terminal states are immutable except for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self → next` is a legal transition. PENDING advances only to
    /// PROCESSING; PROCESSING may re-assert itself (progress message
    /// updates); terminal states accept nothing.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing),
            Self::Processing => !matches!(next, Self::Pending),
            Self::Completed | Self::Failed => false,
        }
    }
}

/// A persisted unit of asynchronous scoring work.
///
/// At most one of `result` / `error_detail` is populated, and only when the
/// status matches (COMPLETED ↔ result, FAILED ↔ error_detail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    /// Stored verbatim — the dedup cache matches on byte-identical text.
    pub job_description: String,
    /// Set once at creation, immutable thereafter.
    pub created_at: DateTime<Utc>,
    /// Latest human-readable progress note; overwritten on every transition.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoringResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl Task {
    pub fn new_pending(
        task_id: String,
        job_description: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            status: TaskStatus::Pending,
            job_description,
            created_at,
            message: "Task received, scoring queued".to_string(),
            result: None,
            error_detail: None,
        }
    }
}
