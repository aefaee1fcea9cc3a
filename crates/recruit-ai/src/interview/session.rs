use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::{AudioAnalysis, ChunkEvaluation};

/// Opaque identifier of a live interview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: f64,
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub timestamp: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerStats {
    pub total_notes: usize,
    pub last_note: String,
}

/// Running summary answered to `evaluation_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub session_id: SessionId,
    pub duration: f64,
    pub total_transcripts: usize,
    pub total_evaluations: usize,
    pub speaker_stats: BTreeMap<String, SpeakerStats>,
    pub average_score: f64,
}

/// Everything collected during a session, produced once at `session_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: f64,
    pub transcripts: Vec<TranscriptEntry>,
    pub evaluations: Vec<ChunkEvaluation>,
    pub speaker_notes: BTreeMap<String, Vec<NoteEntry>>,
}

/// Out-of-band progress probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub is_active: bool,
    pub start_time: DateTime<Utc>,
    pub duration: f64,
    pub total_transcripts: usize,
    pub total_evaluations: usize,
    pub speakers: Vec<String>,
}

/// What a processed audio chunk added to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordedAnalysis {
    pub transcript: bool,
    pub evaluation: bool,
}

/// In-memory data collected for one interview.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    session_id: SessionId,
    started_at: DateTime<Utc>,
    transcripts: Vec<TranscriptEntry>,
    evaluations: Vec<ChunkEvaluation>,
    speaker_notes: BTreeMap<String, Vec<NoteEntry>>,
}

impl InterviewSession {
    pub fn new(session_id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            started_at,
            transcripts: Vec::new(),
            evaluations: Vec::new(),
            speaker_notes: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn transcripts(&self) -> &[TranscriptEntry] {
        &self.transcripts
    }

    pub fn evaluations(&self) -> &[ChunkEvaluation] {
        &self.evaluations
    }

    #[cfg(test)]
    pub(crate) fn notes_for(&self, speaker: &str) -> &[NoteEntry] {
        self.speaker_notes
            .get(speaker)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn record_analysis(&mut self, analysis: &AudioAnalysis) -> RecordedAnalysis {
        let mut recorded = RecordedAnalysis::default();

        if let Some(text) = analysis.transcript_text() {
            self.transcripts.push(TranscriptEntry {
                timestamp: analysis.timestamp,
                speaker: analysis.speaker().to_string(),
                text: text.to_string(),
            });
            recorded.transcript = true;
        }

        if let Some(evaluation) = analysis.scored_evaluation() {
            self.evaluations.push(evaluation.clone());
            recorded.evaluation = true;
        }

        recorded
    }

    pub fn add_note(&mut self, speaker: &str, note: &str, timestamp: f64) {
        self.speaker_notes
            .entry(speaker.to_string())
            .or_default()
            .push(NoteEntry {
                timestamp,
                note: note.to_string(),
            });
    }

    /// Seconds since the session started; never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    /// Mean evaluation score, 0 when nothing has been scored.
    pub fn average_score(&self) -> f64 {
        if self.evaluations.is_empty() {
            return 0.0;
        }
        let total: f64 = self.evaluations.iter().map(|evaluation| evaluation.score).sum();
        total / self.evaluations.len() as f64
    }

    pub fn summary(&self, now: DateTime<Utc>) -> EvaluationSummary {
        let speaker_stats = self
            .speaker_notes
            .iter()
            .map(|(speaker, notes)| {
                let stats = SpeakerStats {
                    total_notes: notes.len(),
                    last_note: notes.last().map(|entry| entry.note.clone()).unwrap_or_default(),
                };
                (speaker.clone(), stats)
            })
            .collect();

        EvaluationSummary {
            session_id: self.session_id.clone(),
            duration: self.elapsed_seconds(now),
            total_transcripts: self.transcripts.len(),
            total_evaluations: self.evaluations.len(),
            speaker_stats,
            average_score: self.average_score(),
        }
    }

    pub fn status(&self, is_active: bool, now: DateTime<Utc>) -> SessionStatus {
        SessionStatus {
            session_id: self.session_id.clone(),
            is_active,
            start_time: self.started_at,
            duration: self.elapsed_seconds(now),
            total_transcripts: self.transcripts.len(),
            total_evaluations: self.evaluations.len(),
            speakers: self.speaker_notes.keys().cloned().collect(),
        }
    }

    pub fn into_final_report(self, now: DateTime<Utc>) -> FinalReport {
        let duration = self.elapsed_seconds(now);
        FinalReport {
            session_id: self.session_id,
            start_time: self.started_at,
            end_time: now,
            duration,
            transcripts: self.transcripts,
            evaluations: self.evaluations,
            speaker_notes: self.speaker_notes,
        }
    }
}
