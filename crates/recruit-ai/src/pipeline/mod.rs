//! Application status model: per-stage interview statuses and the bridge to the
//! flat legacy status code still consumed by older clients.

mod bridge;
mod legacy;
pub mod router;
mod stage;

pub use bridge::{legacy_to_new, new_to_legacy, PipelineState};
pub use legacy::LegacyStatus;
pub use router::pipeline_router;
pub use stage::{ParseStageStatusError, StageStatus};
