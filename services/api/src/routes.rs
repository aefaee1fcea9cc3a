use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use recruit_ai::interview::{
    interview_router, AudioAnalyzer, InterviewSessionService, SessionArchive,
};
use recruit_ai::pipeline::pipeline_router;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<A, S>(
    interviews: Arc<InterviewSessionService<A, S>>,
) -> axum::Router
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    interview_router(interviews)
        .merge(pipeline_router())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySessionArchive;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use recruit_ai::config::InterviewConfig;
    use recruit_ai::interview::{SessionRegistry, SimulatedAnalyzer};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let interviews = Arc::new(InterviewSessionService::new(
            Arc::new(SessionRegistry::new()),
            Arc::new(SimulatedAnalyzer),
            Arc::new(InMemorySessionArchive::default()),
            InterviewConfig::default(),
        ));
        with_service_routes(interviews).layer(Extension(state))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let state = state(false);
        let (status, body) = get(app(state.clone()), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        state.readiness.store(true, Ordering::Release);
        let (status, body) = get(app(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn merged_router_serves_pipeline_and_interview_routes() {
        let (status, body) = get(app(state(true)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get(app(state(true)), "/api/v1/pipeline/legacy/FIRST_PASSED").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stages"]["practical_interview_status"], "PASSED");

        let (status, body) = get(app(state(true)), "/interview/session/nobody/status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }
}
