//! Execution outcome taxonomy and per-run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of results an execution request can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every dispatched cycle completed.
    Success,
    /// A full ring scan exhausted without a shape match.
    ObjectNotFound,
    /// Sensor/Human flag false, or Find condition unmatched with no
    /// otherwise branch.
    ConditionNotMet,
    /// Reachability probe or controller handshake failed. Fatal, no retry.
    ConnectionFailed,
    /// Tree violated the chain invariants or referenced an unresolved
    /// record. Reported before any hardware interaction.
    MalformedProgram,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Summary of one execution request, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub task_id: String,
    pub outcome: RunOutcome,
    /// Human-readable failure detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Object searches performed (ring scans started, including condition
    /// presence checks).
    pub searches: u32,
    /// Completed place cycles. Placements from iterations that finished
    /// before a failure remain counted.
    pub placements: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new(task_id: impl Into<String>, outcome: RunOutcome, started_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            outcome,
            detail: None,
            searches: 0,
            placements: 0,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_counts(mut self, searches: u32, placements: u32) -> Self {
        self.searches = searches;
        self.placements = placements;
        self
    }
}
