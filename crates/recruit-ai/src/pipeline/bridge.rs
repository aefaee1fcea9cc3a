use serde::{Deserialize, Serialize};
use tracing::warn;

use super::legacy::LegacyStatus;
use super::stage::StageStatus;

use StageStatus::{Completed, Failed, InProgress, Passed, Pending, Scheduled};

/// Per-stage view of an application's interview pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(rename = "ai_interview_status")]
    pub ai: StageStatus,
    #[serde(rename = "practical_interview_status")]
    pub practical: StageStatus,
    #[serde(rename = "executive_interview_status")]
    pub executive: StageStatus,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(Pending, Pending, Pending)
    }
}

impl PipelineState {
    pub const fn new(ai: StageStatus, practical: StageStatus, executive: StageStatus) -> Self {
        Self {
            ai,
            practical,
            executive,
        }
    }

    pub const fn from_legacy(legacy: LegacyStatus) -> Self {
        let (ai, practical, executive) = match legacy {
            LegacyStatus::Pending => (Pending, Pending, Pending),
            LegacyStatus::Scheduled => (Scheduled, Pending, Pending),
            LegacyStatus::InProgress => (InProgress, Pending, Pending),
            LegacyStatus::Completed => (Completed, Pending, Pending),
            LegacyStatus::Passed => (Passed, Pending, Pending),
            LegacyStatus::Failed => (Failed, Pending, Pending),
            LegacyStatus::FirstScheduled => (Passed, Scheduled, Pending),
            LegacyStatus::FirstInProgress => (Passed, InProgress, Pending),
            LegacyStatus::FirstCompleted => (Passed, Completed, Pending),
            LegacyStatus::FirstPassed => (Passed, Passed, Pending),
            LegacyStatus::FirstFailed => (Passed, Failed, Pending),
            LegacyStatus::SecondScheduled => (Passed, Passed, Scheduled),
            LegacyStatus::SecondInProgress => (Passed, Passed, InProgress),
            LegacyStatus::SecondCompleted => (Passed, Passed, Completed),
            LegacyStatus::SecondPassed => (Passed, Passed, Passed),
            LegacyStatus::SecondFailed => (Passed, Passed, Failed),
        };
        Self::new(ai, practical, executive)
    }

    /// Collapses the three stages into one legacy code. First matching rule wins.
    ///
    /// This is not an inverse of [`PipelineState::from_legacy`]: every open
    /// practical stage reads as `FIRST_IN_PROGRESS`, every open executive stage
    /// as `SECOND_IN_PROGRESS`, and a `COMPLETED` stage with no verdict falls
    /// through to `PENDING`.
    pub fn legacy_status(&self) -> LegacyStatus {
        if self.ai.is_open() {
            return match self.ai {
                Scheduled => LegacyStatus::Scheduled,
                InProgress => LegacyStatus::InProgress,
                _ => LegacyStatus::Pending,
            };
        }
        if self.ai == Failed {
            return LegacyStatus::Failed;
        }
        if self.ai == Passed && self.practical.is_open() {
            return LegacyStatus::FirstInProgress;
        }
        if self.practical == Failed {
            return LegacyStatus::FirstFailed;
        }
        if self.practical == Passed && self.executive.is_open() {
            return LegacyStatus::SecondInProgress;
        }
        match self.executive {
            Passed => LegacyStatus::SecondPassed,
            Failed => LegacyStatus::SecondFailed,
            _ => LegacyStatus::Pending,
        }
    }

    /// A later stage may only leave `PENDING` once every earlier stage has passed.
    pub fn is_monotonic(&self) -> bool {
        let practical_ok = self.practical == Pending || self.ai == Passed;
        let executive_ok =
            self.executive == Pending || (self.ai == Passed && self.practical == Passed);
        practical_ok && executive_ok
    }

    /// Parses three raw stage tokens; any invalid token resets the whole state to all-`PENDING`.
    pub fn parse_or_default(ai: &str, practical: &str, executive: &str) -> Self {
        match parse_triple(ai, practical, executive) {
            Some(state) => state,
            None => {
                warn!(
                    ai,
                    practical,
                    executive,
                    "invalid stage status; defaulting pipeline to PENDING"
                );
                Self::default()
            }
        }
    }
}

fn parse_triple(ai: &str, practical: &str, executive: &str) -> Option<PipelineState> {
    Some(PipelineState::new(
        ai.parse().ok()?,
        practical.parse().ok()?,
        executive.parse().ok()?,
    ))
}

/// Maps a legacy code to its per-stage statuses. Unknown codes map to all-`PENDING`.
pub fn legacy_to_new(code: &str) -> PipelineState {
    LegacyStatus::from_code(code)
        .map(PipelineState::from_legacy)
        .unwrap_or_default()
}

/// Maps three raw stage tokens to a legacy code. Any unparseable token yields `PENDING`.
pub fn new_to_legacy(ai: &str, first: &str, second: &str) -> LegacyStatus {
    parse_triple(ai, first, second)
        .map(|state| state.legacy_status())
        .unwrap_or(LegacyStatus::Pending)
}
