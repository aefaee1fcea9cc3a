use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};

use crate::config::InterviewConfig;
use crate::interview::analysis::{
    AnalysisError, AudioAnalysis, AudioAnalyzer, ChunkEvaluation, Diarization, Transcription,
};
use crate::interview::archive::{ArchiveError, SessionArchive};
use crate::interview::protocol::{OutboundMessage, Reply};
use crate::interview::registry::{SessionLease, SessionRegistry};
use crate::interview::service::InterviewSessionService;
use crate::interview::session::{FinalReport, SessionId};

pub(super) fn analysis(
    text: &str,
    speaker: Option<&str>,
    score: f64,
    timestamp: f64,
) -> AudioAnalysis {
    AudioAnalysis {
        timestamp,
        transcription: Transcription {
            text: text.to_string(),
            success: true,
        },
        diarization: Diarization {
            current_speaker: speaker.map(str::to_string),
            confidence: 0.88,
        },
        evaluation: Some(ChunkEvaluation {
            speaker: speaker.unwrap_or("unknown").to_string(),
            text: text.to_string(),
            timestamp,
            score,
            feedback: vec!["구체적인 경험을 잘 설명했습니다".to_string()],
            keywords: vec!["기술: 2개".to_string()],
        }),
        success: true,
    }
}

/// Returns a canned result and records what it saw on disk.
#[derive(Default)]
pub(super) struct ScriptedAnalyzer {
    results: Mutex<Vec<AudioAnalysis>>,
    seen: Mutex<Vec<SeenChunk>>,
}

#[derive(Debug, Clone)]
pub(super) struct SeenChunk {
    pub(super) path: PathBuf,
    pub(super) bytes: Vec<u8>,
    pub(super) timestamp: f64,
}

impl ScriptedAnalyzer {
    pub(super) fn returning(mut results: Vec<AudioAnalysis>) -> Self {
        results.reverse();
        Self {
            results: Mutex::new(results),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn seen(&self) -> Vec<SeenChunk> {
        self.seen.lock().expect("seen mutex poisoned").clone()
    }
}

#[async_trait]
impl AudioAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, audio: &Path, timestamp: f64) -> Result<AudioAnalysis, AnalysisError> {
        let bytes = std::fs::read(audio)?;
        self.seen.lock().expect("seen mutex poisoned").push(SeenChunk {
            path: audio.to_path_buf(),
            bytes,
            timestamp,
        });
        self.results
            .lock()
            .expect("results mutex poisoned")
            .pop()
            .ok_or_else(|| AnalysisError::Unavailable("no scripted result left".to_string()))
    }
}

pub(super) struct UnavailableAnalyzer;

#[async_trait]
impl AudioAnalyzer for UnavailableAnalyzer {
    async fn analyze(
        &self,
        _audio: &Path,
        _timestamp: f64,
    ) -> Result<AudioAnalysis, AnalysisError> {
        Err(AnalysisError::Unavailable("speech model offline".to_string()))
    }
}

/// Signals when analysis starts, then stalls for `delay`.
pub(super) struct StallingAnalyzer {
    pub(super) started: Arc<Notify>,
    pub(super) delay: Duration,
}

#[async_trait]
impl AudioAnalyzer for StallingAnalyzer {
    async fn analyze(&self, _audio: &Path, timestamp: f64) -> Result<AudioAnalysis, AnalysisError> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        Ok(analysis("늦은 응답입니다.", Some("지원자_1"), 70.0, timestamp))
    }
}

#[derive(Default)]
pub(super) struct MemoryArchive {
    reports: Mutex<Vec<FinalReport>>,
}

impl MemoryArchive {
    pub(super) fn reports(&self) -> Vec<FinalReport> {
        self.reports.lock().expect("archive mutex poisoned").clone()
    }
}

impl SessionArchive for MemoryArchive {
    fn archive(&self, report: &FinalReport) -> Result<(), ArchiveError> {
        self.reports
            .lock()
            .expect("archive mutex poisoned")
            .push(report.clone());
        Ok(())
    }
}

pub(super) struct UnavailableArchive;

impl SessionArchive for UnavailableArchive {
    fn archive(&self, _report: &FinalReport) -> Result<(), ArchiveError> {
        Err(ArchiveError::Unavailable("report store offline".to_string()))
    }
}

pub(super) fn interview_config() -> InterviewConfig {
    InterviewConfig {
        analysis_timeout: Duration::from_millis(250),
        outbound_buffer: 16,
        max_frame_bytes: 64 * 1024,
        audio_tmp_dir: None,
    }
}

pub(super) fn service_with<A, S>(
    analyzer: Arc<A>,
    archive: Arc<S>,
    config: InterviewConfig,
) -> Arc<InterviewSessionService<A, S>>
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    Arc::new(InterviewSessionService::new(
        Arc::new(SessionRegistry::new()),
        analyzer,
        archive,
        config,
    ))
}

pub(super) fn open_session<A, S>(
    service: &InterviewSessionService<A, S>,
    session_id: &str,
) -> (SessionLease, mpsc::Receiver<Reply>)
where
    A: AudioAnalyzer + 'static,
    S: SessionArchive + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    let lease = service
        .connect(SessionId::from(session_id), tx)
        .expect("session connects");
    (lease, rx)
}

pub(super) fn audio_frame(bytes: &[u8], timestamp: f64) -> String {
    json!({
        "type": "audio_chunk",
        "audio_data": BASE64.encode(bytes),
        "timestamp": timestamp,
    })
    .to_string()
}

pub(super) fn note_frame(speaker: &str, note: &str, timestamp: f64) -> String {
    json!({
        "type": "speaker_note",
        "speaker": speaker,
        "note": note,
        "timestamp": timestamp,
    })
    .to_string()
}

pub(super) fn next_reply(rx: &mut mpsc::Receiver<Reply>) -> Reply {
    rx.try_recv().expect("a reply was queued")
}

pub(super) fn expect_error(reply: Reply) -> String {
    match reply {
        Reply::Error { error } => error,
        other => panic!("expected error reply, got {other:?}"),
    }
}

pub(super) fn expect_message(reply: Reply) -> OutboundMessage {
    match reply {
        Reply::Message(message) => message,
        other => panic!("expected message reply, got {other:?}"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
