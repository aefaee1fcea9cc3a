use axum::{
    extract::Path,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::bridge::{legacy_to_new, new_to_legacy, PipelineState};
use super::legacy::LegacyStatus;

/// Router exposing the status bridge to clients that still speak legacy codes.
pub fn pipeline_router() -> Router {
    Router::new()
        .route("/api/v1/pipeline/legacy", post(collapse_handler))
        .route("/api/v1/pipeline/legacy/:code", get(expand_handler))
}

#[derive(Debug, Serialize)]
pub struct ExpandedStatusView {
    pub legacy_status: String,
    pub recognized: bool,
    pub stages: PipelineState,
}

/// Raw stage tokens; they are not validated before conversion.
#[derive(Debug, Deserialize)]
pub struct StageStatusesPayload {
    pub ai_interview_status: String,
    pub practical_interview_status: String,
    pub executive_interview_status: String,
}

#[derive(Debug, Serialize)]
pub struct CollapsedStatusView {
    pub legacy_status: LegacyStatus,
}

pub(crate) async fn expand_handler(Path(code): Path<String>) -> Json<ExpandedStatusView> {
    let recognized = LegacyStatus::from_code(&code).is_some();
    let stages = legacy_to_new(&code);
    Json(ExpandedStatusView {
        legacy_status: code,
        recognized,
        stages,
    })
}

pub(crate) async fn collapse_handler(
    Json(payload): Json<StageStatusesPayload>,
) -> Json<CollapsedStatusView> {
    let legacy_status = new_to_legacy(
        &payload.ai_interview_status,
        &payload.practical_interview_status,
        &payload.executive_interview_status,
    );
    Json(CollapsedStatusView { legacy_status })
}
