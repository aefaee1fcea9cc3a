use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionArchive};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruit_ai::config::AppConfig;
use recruit_ai::error::AppError;
use recruit_ai::interview::{InterviewSessionService, SessionRegistry, SimulatedAnalyzer};
use recruit_ai::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = Arc::new(SessionRegistry::new());
    let interviews = Arc::new(InterviewSessionService::new(
        registry.clone(),
        Arc::new(SimulatedAnalyzer),
        Arc::new(InMemorySessionArchive::default()),
        config.interview.clone(),
    ));

    let app = with_service_routes(interviews)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        analysis_timeout = ?config.interview.analysis_timeout,
        "recruiting interview service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry, readiness_flag))
        .await?;
    Ok(())
}

async fn shutdown_signal(registry: Arc<SessionRegistry>, readiness: Arc<AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    readiness.store(false, Ordering::Release);
    let active = registry.active_sessions();
    let closed = registry.close_all();
    info!(
        closed_sessions = closed,
        sessions = ?active,
        "shutting down; live interview sessions cancelled"
    );
}
