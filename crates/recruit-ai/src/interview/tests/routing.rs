use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use axum::extract::ws::Message;

use crate::interview::router::{
    classify_frame, interview_router, status_handler, SocketFrame, BINARY_FRAME_ERROR,
};

#[tokio::test]
async fn status_probe_returns_not_found_for_unknown_session() {
    let service = service_with(
        Arc::new(ScriptedAnalyzer::default()),
        Arc::new(MemoryArchive::default()),
        interview_config(),
    );

    let response = interview_router(service)
        .oneshot(
            Request::builder()
                .uri("/interview/session/missing/status")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "Session not found");
}

#[tokio::test]
async fn status_probe_reports_live_session() {
    let service = service_with(
        Arc::new(ScriptedAnalyzer::default()),
        Arc::new(MemoryArchive::default()),
        interview_config(),
    );
    let (lease, mut rx) = open_session(&service, "sess-live");
    service
        .dispatch(&lease, &note_frame("면접관_2", "침착하게 답변", 2.0))
        .await;
    let _ = next_reply(&mut rx);

    let response = status_handler(State(service.clone()), Path("sess-live".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["session_id"], "sess-live");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["total_transcripts"], 0);
    assert_eq!(body["speakers"], serde_json::json!(["면접관_2"]));
    assert!(body["start_time"].is_string());
}

#[tokio::test]
async fn status_probe_marks_session_inactive_once_writer_is_gone() {
    let service = service_with(
        Arc::new(ScriptedAnalyzer::default()),
        Arc::new(MemoryArchive::default()),
        interview_config(),
    );
    let (_lease, rx) = open_session(&service, "sess-stale");
    drop(rx);

    let response = status_handler(State(service), Path("sess-stale".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["is_active"], false);
}

#[tokio::test]
async fn websocket_route_rejects_plain_http() {
    let service = service_with(
        Arc::new(ScriptedAnalyzer::default()),
        Arc::new(MemoryArchive::default()),
        interview_config(),
    );

    let response = interview_router(service)
        .oneshot(
            Request::builder()
                .uri("/ws/interview/sess-http")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert!(response.status().is_client_error());
}

#[test]
fn socket_frames_are_classified_without_lossy_decoding() {
    assert_eq!(
        classify_frame(Message::Text(r#"{"type":"session_end"}"#.to_string())),
        SocketFrame::Text(r#"{"type":"session_end"}"#.to_string())
    );
    assert_eq!(
        classify_frame(Message::Binary(vec![0xff, 0xfe, b'{'])),
        SocketFrame::Binary
    );
    assert_eq!(classify_frame(Message::Ping(Vec::new())), SocketFrame::Control);
    assert_eq!(classify_frame(Message::Close(None)), SocketFrame::Closed);
    assert!(BINARY_FRAME_ERROR.starts_with("Invalid message:"));
}
