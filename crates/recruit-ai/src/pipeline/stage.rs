use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Progress of a single interview stage (AI, practical, executive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Passed,
    Failed,
}

impl StageStatus {
    pub const ALL: [StageStatus; 6] = [
        StageStatus::Pending,
        StageStatus::Scheduled,
        StageStatus::InProgress,
        StageStatus::Completed,
        StageStatus::Passed,
        StageStatus::Failed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StageStatus::Pending => "PENDING",
            StageStatus::Scheduled => "SCHEDULED",
            StageStatus::InProgress => "IN_PROGRESS",
            StageStatus::Completed => "COMPLETED",
            StageStatus::Passed => "PASSED",
            StageStatus::Failed => "FAILED",
        }
    }

    /// Stage has not produced a result yet: pending, scheduled or running.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            StageStatus::Pending | StageStatus::Scheduled | StageStatus::InProgress
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageStatus {
    type Err = ParseStageStatusError;

    /// Exact, case-sensitive match on the wire token.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        StageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| ParseStageStatusError {
                value: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized stage status '{value}'")]
pub struct ParseStageStatusError {
    pub value: String,
}
