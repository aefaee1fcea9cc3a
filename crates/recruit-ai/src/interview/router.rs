use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::analysis::AudioAnalyzer;
use super::archive::SessionArchive;
use super::protocol::Reply;
use super::registry::SessionError;
use super::service::InterviewSessionService;
use super::session::SessionId;

pub fn interview_router<A, S>(service: Arc<InterviewSessionService<A, S>>) -> Router
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    Router::new()
        .route("/ws/interview/:session_id", get(websocket_handler::<A, S>))
        .route(
            "/interview/session/:session_id/status",
            get(status_handler::<A, S>),
        )
        .with_state(service)
}

pub(crate) async fn websocket_handler<A, S>(
    ws: WebSocketUpgrade,
    State(service): State<Arc<InterviewSessionService<A, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    let max_frame = service.config().max_frame_bytes;
    ws.max_message_size(max_frame)
        .on_upgrade(move |socket| serve_socket(service, SessionId(session_id), socket))
}

pub(crate) async fn status_handler<A, S>(
    State(service): State<Arc<InterviewSessionService<A, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    match service.status(&SessionId(session_id)) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(err @ SessionError::NotFound(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err @ SessionError::AlreadyActive(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
    }
}

/// Bridges one upgraded socket onto the session service.
///
/// A dedicated writer task drains queued replies so analysis never blocks on a
/// slow client; the reader forwards text frames in arrival order and cancels
/// the lease when the transport closes.
async fn serve_socket<A, S>(
    service: Arc<InterviewSessionService<A, S>>,
    session_id: SessionId,
    socket: WebSocket,
) where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    let (mut sink, mut stream) = socket.split();
    let buffer = service.config().outbound_buffer;
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Reply>(buffer);

    let lease = match service.connect(session_id.clone(), outbound_tx) {
        Ok(lease) => lease,
        Err(err) => {
            if let Ok(frame) = Reply::error(err.to_string()).to_json() {
                let _ = sink.send(Message::Text(frame)).await;
            }
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "session already active".into(),
                })))
                .await;
            return;
        }
    };

    let writer_session = session_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(reply) = outbound_rx.recv().await {
            let frame = match reply.to_json() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(session_id = %writer_session, error = %err, "failed to encode reply");
                    continue;
                }
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                debug!(session_id = %writer_session, "socket closed while writing");
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(buffer);
    let reader_lease = lease.clone();
    let reader = tokio::spawn(async move {
        let cancel = reader_lease.cancellation();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = stream.next() => next,
            };
            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    warn!(
                        session_id = %reader_lease.session_id(),
                        error = %err,
                        "socket read failed"
                    );
                    break;
                }
                None => break,
            };
            match classify_frame(message) {
                SocketFrame::Text(text) => {
                    if inbound_tx.send(text).await.is_err() {
                        return;
                    }
                }
                SocketFrame::Binary => {
                    reader_lease.send(Reply::error(BINARY_FRAME_ERROR)).await;
                }
                SocketFrame::Control => {}
                SocketFrame::Closed => break,
            }
        }
        // Transport closed; in-flight analysis must not outlive it.
        cancel.cancel();
    });

    service.run(lease, inbound_rx).await;
    let _ = reader.await;
    let _ = writer.await;
}

pub(crate) const BINARY_FRAME_ERROR: &str = "Invalid message: binary frames are not supported";

#[derive(Debug, PartialEq)]
pub(crate) enum SocketFrame {
    Text(String),
    Binary,
    Control,
    Closed,
}

pub(crate) fn classify_frame(message: Message) -> SocketFrame {
    match message {
        Message::Text(text) => SocketFrame::Text(text),
        Message::Binary(_) => SocketFrame::Binary,
        Message::Ping(_) | Message::Pong(_) => SocketFrame::Control,
        Message::Close(_) => SocketFrame::Closed,
    }
}
