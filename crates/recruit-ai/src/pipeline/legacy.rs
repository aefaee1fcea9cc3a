use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat status code used by older consumers to describe the whole interview pipeline.
///
/// The first six codes describe the AI interview stage, `First*` codes the
/// practical interview and `Second*` codes the executive interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacyStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Passed,
    Failed,
    FirstScheduled,
    FirstInProgress,
    FirstCompleted,
    FirstPassed,
    FirstFailed,
    SecondScheduled,
    SecondInProgress,
    SecondCompleted,
    SecondPassed,
    SecondFailed,
}

impl LegacyStatus {
    pub const ALL: [LegacyStatus; 16] = [
        LegacyStatus::Pending,
        LegacyStatus::Scheduled,
        LegacyStatus::InProgress,
        LegacyStatus::Completed,
        LegacyStatus::Passed,
        LegacyStatus::Failed,
        LegacyStatus::FirstScheduled,
        LegacyStatus::FirstInProgress,
        LegacyStatus::FirstCompleted,
        LegacyStatus::FirstPassed,
        LegacyStatus::FirstFailed,
        LegacyStatus::SecondScheduled,
        LegacyStatus::SecondInProgress,
        LegacyStatus::SecondCompleted,
        LegacyStatus::SecondPassed,
        LegacyStatus::SecondFailed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            LegacyStatus::Pending => "PENDING",
            LegacyStatus::Scheduled => "SCHEDULED",
            LegacyStatus::InProgress => "IN_PROGRESS",
            LegacyStatus::Completed => "COMPLETED",
            LegacyStatus::Passed => "PASSED",
            LegacyStatus::Failed => "FAILED",
            LegacyStatus::FirstScheduled => "FIRST_SCHEDULED",
            LegacyStatus::FirstInProgress => "FIRST_IN_PROGRESS",
            LegacyStatus::FirstCompleted => "FIRST_COMPLETED",
            LegacyStatus::FirstPassed => "FIRST_PASSED",
            LegacyStatus::FirstFailed => "FIRST_FAILED",
            LegacyStatus::SecondScheduled => "SECOND_SCHEDULED",
            LegacyStatus::SecondInProgress => "SECOND_IN_PROGRESS",
            LegacyStatus::SecondCompleted => "SECOND_COMPLETED",
            LegacyStatus::SecondPassed => "SECOND_PASSED",
            LegacyStatus::SecondFailed => "SECOND_FAILED",
        }
    }

    /// Exact lookup; `None` for anything outside the sixteen known codes.
    pub fn from_code(code: &str) -> Option<Self> {
        LegacyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == code)
    }
}

impl fmt::Display for LegacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
