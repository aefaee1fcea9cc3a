//! Real-time interview sessions over WebSocket.
//!
//! One connection owns one session id. Audio chunks are analyzed as they
//! arrive; notes, summaries and the final report are kept in memory until the
//! client ends the session or disconnects.

pub mod analysis;
pub mod archive;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use analysis::{
    AnalysisError, AudioAnalysis, AudioAnalyzer, ChunkEvaluation, Diarization, SimulatedAnalyzer,
    Transcription,
};
pub use archive::{ArchiveError, SessionArchive};
pub use protocol::{InboundMessage, OutboundMessage, ProtocolError, Reply};
pub use registry::{SessionError, SessionLease, SessionRegistry};
pub use router::interview_router;
pub use service::{DisconnectReason, Dispatch, InterviewSessionService};
pub use session::{
    EvaluationSummary, FinalReport, InterviewSession, NoteEntry, SessionId, SessionStatus,
    SpeakerStats, TranscriptEntry,
};
