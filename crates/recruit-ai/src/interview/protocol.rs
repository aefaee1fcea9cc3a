//! JSON frames exchanged over the interview socket.
//!
//! Every frame is an object discriminated by its `type` field. Replies that
//! report a problem carry only an `error` field.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::analysis::AudioAnalysis;
use super::session::{EvaluationSummary, FinalReport};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    AudioChunk {
        audio_data: Option<String>,
        timestamp: Option<f64>,
    },
    SpeakerNote {
        speaker: Option<String>,
        note: Option<String>,
        timestamp: Option<f64>,
    },
    EvaluationRequest,
    SessionEnd,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Invalid message: expected a JSON object")]
    NotAnObject,
    #[error("Message too large: {size} bytes exceeds {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Parses one text frame. Objects without a string `type` decode as [`InboundMessage::Unknown`].
pub fn decode(raw: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(raw).map_err(ProtocolError::Malformed)?;
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }
    if !matches!(value.get("type"), Some(Value::String(_))) {
        return Ok(InboundMessage::Unknown);
    }
    serde_json::from_value(value).map_err(ProtocolError::Malformed)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    AudioProcessed {
        result: AudioAnalysis,
    },
    NoteSaved {
        speaker: String,
        note: String,
        timestamp: f64,
    },
    EvaluationSummary {
        summary: EvaluationSummary,
    },
    SessionEnded {
        final_result: FinalReport,
    },
}

/// Frame queued for the socket writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Message(OutboundMessage),
    Error { error: String },
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error {
            error: message.into(),
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Reply::Message(OutboundMessage::AudioProcessed { .. }) => "audio_processed",
            Reply::Message(OutboundMessage::NoteSaved { .. }) => "note_saved",
            Reply::Message(OutboundMessage::EvaluationSummary { .. }) => "evaluation_summary",
            Reply::Message(OutboundMessage::SessionEnded { .. }) => "session_ended",
            Reply::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<OutboundMessage> for Reply {
    fn from(message: OutboundMessage) -> Self {
        Reply::Message(message)
    }
}

/// Wall-clock seconds since the epoch, used when a client omits `timestamp`.
pub fn now_epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
