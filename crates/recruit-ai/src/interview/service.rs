use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::InterviewConfig;

use super::analysis::{AnalysisError, AudioAnalysis, AudioAnalyzer};
use super::archive::SessionArchive;
use super::protocol::{
    decode, now_epoch_seconds, InboundMessage, OutboundMessage, ProtocolError, Reply,
};
use super::registry::{SessionError, SessionLease, SessionRegistry};
use super::session::{SessionId, SessionStatus};

/// Whether the connection should keep reading after a frame was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    ClientClosed,
    SessionEnded,
    Cancelled,
}

impl DisconnectReason {
    pub fn label(self) -> &'static str {
        match self {
            DisconnectReason::ClientClosed => "client_closed",
            DisconnectReason::SessionEnded => "session_ended",
            DisconnectReason::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AudioChunkError {
    #[error("Invalid audio data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Failed to stage audio chunk: {0}")]
    Scratch(#[from] std::io::Error),
    #[error("Audio analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("session closed during analysis")]
    Cancelled,
}

/// Runs interview sessions: decodes client frames, drives audio analysis and
/// keeps per-session state in the shared [`SessionRegistry`].
pub struct InterviewSessionService<A, S> {
    registry: Arc<SessionRegistry>,
    analyzer: Arc<A>,
    archive: Arc<S>,
    config: InterviewConfig,
}

impl<A, S> InterviewSessionService<A, S>
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    pub fn new(
        registry: Arc<SessionRegistry>,
        analyzer: Arc<A>,
        archive: Arc<S>,
        config: InterviewConfig,
    ) -> Self {
        Self {
            registry,
            analyzer,
            archive,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn connect(
        &self,
        session_id: SessionId,
        outbound: mpsc::Sender<Reply>,
    ) -> Result<SessionLease, SessionError> {
        match self.registry.connect(session_id.clone(), outbound, Utc::now()) {
            Ok(lease) => {
                info!(
                    event = "interview_connected",
                    session_id = %session_id,
                    connection_id = lease.connection_id(),
                    "interview session connected"
                );
                Ok(lease)
            }
            Err(err) => {
                warn!(
                    event = "interview_rejected",
                    session_id = %session_id,
                    error = %err,
                    "rejected duplicate interview connection"
                );
                Err(err)
            }
        }
    }

    /// Handles frames in arrival order until the client goes away, the session
    /// ends or the lease is cancelled. Always tears the session down on exit.
    ///
    /// The inbound side is watched while a frame is being handled, so a client
    /// that disconnects mid-analysis cancels the analysis instead of waiting it out.
    /// At most one frame is read ahead.
    pub async fn run(
        &self,
        lease: SessionLease,
        mut inbound: mpsc::Receiver<String>,
    ) -> DisconnectReason {
        let mut read_ahead: Option<String> = None;
        let cancel = lease.cancellation();
        let reason = loop {
            if cancel.is_cancelled() {
                break DisconnectReason::Cancelled;
            }
            let raw = match read_ahead.take() {
                Some(raw) => raw,
                None => {
                    let frame = tokio::select! {
                        biased;
                        _ = lease.cancelled() => break DisconnectReason::Cancelled,
                        frame = inbound.recv() => frame,
                    };
                    match frame {
                        Some(raw) => raw,
                        None => break DisconnectReason::ClientClosed,
                    }
                }
            };

            let mut client_closed = false;
            let outcome = {
                let dispatch = self.dispatch(&lease, &raw);
                tokio::pin!(dispatch);
                loop {
                    tokio::select! {
                        outcome = &mut dispatch => break outcome,
                        frame = inbound.recv(), if read_ahead.is_none() && !client_closed => {
                            match frame {
                                Some(next) => read_ahead = Some(next),
                                None => {
                                    client_closed = true;
                                    cancel.cancel();
                                }
                            }
                        }
                    }
                }
            };
            if outcome == Dispatch::Ended {
                break DisconnectReason::SessionEnded;
            }
            if client_closed {
                break DisconnectReason::ClientClosed;
            }
        };
        self.disconnect(&lease, reason);
        reason
    }

    pub fn disconnect(&self, lease: &SessionLease, reason: DisconnectReason) {
        let removed = self.registry.disconnect(lease);
        info!(
            event = "interview_disconnected",
            session_id = %lease.session_id(),
            connection_id = lease.connection_id(),
            reason = reason.label(),
            removed,
            "interview session closed"
        );
    }

    pub fn status(&self, session_id: &SessionId) -> Result<SessionStatus, SessionError> {
        self.registry.status(session_id, Utc::now())
    }

    pub async fn dispatch(&self, lease: &SessionLease, raw: &str) -> Dispatch {
        let limit = self.config.max_frame_bytes;
        if raw.len() > limit {
            let err = ProtocolError::TooLarge {
                size: raw.len(),
                limit,
            };
            self.reply(lease, Reply::error(err.to_string())).await;
            return Dispatch::Continue;
        }

        let message = match decode(raw) {
            Ok(message) => message,
            Err(err) => {
                debug!(session_id = %lease.session_id(), error = %err, "rejected client frame");
                self.reply(lease, Reply::error(err.to_string())).await;
                return Dispatch::Continue;
            }
        };

        match message {
            InboundMessage::AudioChunk {
                audio_data,
                timestamp,
            } => self.handle_audio_chunk(lease, audio_data, timestamp).await,
            InboundMessage::SpeakerNote {
                speaker,
                note,
                timestamp,
            } => self.handle_speaker_note(lease, speaker, note, timestamp).await,
            InboundMessage::EvaluationRequest => self.handle_evaluation_request(lease).await,
            InboundMessage::SessionEnd => return self.handle_session_end(lease).await,
            InboundMessage::Unknown => {
                self.reply(lease, Reply::error("Unknown message type")).await;
            }
        }
        Dispatch::Continue
    }

    async fn handle_audio_chunk(
        &self,
        lease: &SessionLease,
        audio_data: Option<String>,
        timestamp: Option<f64>,
    ) {
        let Some(encoded) = audio_data.filter(|data| !data.is_empty()) else {
            self.reply(lease, Reply::error("No audio data provided")).await;
            return;
        };
        let timestamp = timestamp.unwrap_or_else(now_epoch_seconds);

        let analysis = match self.analyze_chunk(lease, &encoded, timestamp).await {
            Ok(analysis) => analysis,
            Err(AudioChunkError::Cancelled) => {
                debug!(session_id = %lease.session_id(), "dropping analysis for closed session");
                return;
            }
            Err(err) => {
                warn!(
                    event = "audio_chunk_failed",
                    session_id = %lease.session_id(),
                    error = %err,
                    "audio chunk processing failed"
                );
                self.reply(lease, Reply::error(err.to_string())).await;
                return;
            }
        };

        let Some(recorded) = self
            .registry
            .with_session(lease, |session| session.record_analysis(&analysis))
        else {
            debug!(session_id = %lease.session_id(), "session closed before analysis was recorded");
            return;
        };
        debug!(
            session_id = %lease.session_id(),
            transcript = recorded.transcript,
            evaluation = recorded.evaluation,
            "audio chunk recorded"
        );

        self.reply(lease, OutboundMessage::AudioProcessed { result: analysis }.into())
            .await;
    }

    /// Decodes the chunk into a scratch file that lives only as long as the analysis.
    async fn analyze_chunk(
        &self,
        lease: &SessionLease,
        encoded: &str,
        timestamp: f64,
    ) -> Result<AudioAnalysis, AudioChunkError> {
        let bytes = BASE64.decode(encoded.trim())?;
        let scratch = write_scratch_file(self.config.audio_tmp_dir.clone(), bytes).await?;

        let limit = self.config.analysis_timeout;
        let analysis = self.analyzer.analyze(scratch.path(), timestamp);
        let outcome = tokio::select! {
            biased;
            _ = lease.cancelled() => None,
            result = tokio::time::timeout(limit, analysis) => Some(result),
        };
        let Some(result) = outcome else {
            return Err(AudioChunkError::Cancelled);
        };
        let analysis = result.map_err(|_| AnalysisError::TimedOut(limit))??;
        Ok(analysis)
    }

    async fn handle_speaker_note(
        &self,
        lease: &SessionLease,
        speaker: Option<String>,
        note: Option<String>,
        timestamp: Option<f64>,
    ) {
        let speaker = speaker.filter(|speaker| !speaker.is_empty());
        let note = note.filter(|note| !note.is_empty());
        let (Some(speaker), Some(note)) = (speaker, note) else {
            self.reply(lease, Reply::error("Speaker and note are required")).await;
            return;
        };
        let timestamp = timestamp.unwrap_or_else(now_epoch_seconds);

        let saved = self
            .registry
            .with_session(lease, |session| session.add_note(&speaker, &note, timestamp));
        let reply = match saved {
            Some(()) => OutboundMessage::NoteSaved {
                speaker,
                note,
                timestamp,
            }
            .into(),
            None => Reply::error(SessionError::NotFound(lease.session_id().clone()).to_string()),
        };
        self.reply(lease, reply).await;
    }

    async fn handle_evaluation_request(&self, lease: &SessionLease) {
        let now = Utc::now();
        let reply = match self.registry.with_session(lease, |session| session.summary(now)) {
            Some(summary) => OutboundMessage::EvaluationSummary { summary }.into(),
            None => Reply::error(SessionError::NotFound(lease.session_id().clone()).to_string()),
        };
        self.reply(lease, reply).await;
    }

    async fn handle_session_end(&self, lease: &SessionLease) -> Dispatch {
        let Some(session) = self.registry.take(lease) else {
            let err = SessionError::NotFound(lease.session_id().clone());
            self.reply(lease, Reply::error(err.to_string())).await;
            return Dispatch::Continue;
        };

        let report = session.into_final_report(Utc::now());
        if let Err(err) = self.archive.archive(&report) {
            warn!(
                event = "interview_archive_failed",
                session_id = %report.session_id,
                error = %err,
                "failed to archive interview report"
            );
        }
        info!(
            event = "interview_ended",
            session_id = %report.session_id,
            transcripts = report.transcripts.len(),
            evaluations = report.evaluations.len(),
            duration_secs = report.duration,
            "interview session ended"
        );

        self.reply(lease, OutboundMessage::SessionEnded { final_result: report }.into())
            .await;
        Dispatch::Ended
    }

    async fn reply(&self, lease: &SessionLease, reply: Reply) {
        let kind = reply.message_type();
        if !lease.send(reply).await {
            debug!(
                session_id = %lease.session_id(),
                reply = kind,
                "socket writer gone; reply dropped"
            );
        }
    }
}

async fn write_scratch_file(
    dir: Option<PathBuf>,
    bytes: Vec<u8>,
) -> std::io::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || {
        let mut builder = tempfile::Builder::new();
        builder.prefix("interview-").suffix(".wav");
        let mut file = match dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(std::io::Error::other)?
}
