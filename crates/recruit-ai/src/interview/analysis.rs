use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Speaker label used when diarization could not attribute a segment.
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// Result of transcribing, diarizing and scoring one audio chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    pub timestamp: f64,
    pub transcription: Transcription,
    pub diarization: Diarization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ChunkEvaluation>,
    pub success: bool,
}

impl AudioAnalysis {
    pub fn speaker(&self) -> &str {
        self.diarization
            .current_speaker
            .as_deref()
            .unwrap_or(UNKNOWN_SPEAKER)
    }

    /// Transcribed text, if any was recognized.
    pub fn transcript_text(&self) -> Option<&str> {
        let text = self.transcription.text.as_str();
        (!text.is_empty()).then_some(text)
    }

    /// Evaluation worth recording: only positive scores count.
    pub fn scored_evaluation(&self) -> Option<&ChunkEvaluation> {
        self.evaluation
            .as_ref()
            .filter(|evaluation| evaluation.score > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diarization {
    #[serde(default)]
    pub current_speaker: Option<String>,
    pub confidence: f64,
}

/// Heuristic evaluation of one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEvaluation {
    pub speaker: String,
    pub text: String,
    pub timestamp: f64,
    pub score: f64,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Speech-to-text, diarization and scoring backend for interview audio.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    async fn analyze(&self, audio: &Path, timestamp: f64) -> Result<AudioAnalysis, AnalysisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("audio chunk unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio analysis unavailable: {0}")]
    Unavailable(String),
    #[error("audio analysis timed out after {0:?}")]
    TimedOut(Duration),
}

const SAMPLE_UTTERANCES: [&str; 4] = [
    "안녕하세요, 지원자입니다.",
    "네, 그 프로젝트에 대해 설명드리겠습니다.",
    "팀워크가 가장 중요하다고 생각합니다.",
    "Java와 Spring Framework를 주로 사용했습니다.",
];

const PANEL_SPEAKERS: [&str; 6] = [
    "면접관_1",
    "면접관_2",
    "면접관_3",
    "지원자_1",
    "지원자_2",
    "지원자_3",
];

/// Stand-in analyzer that fabricates plausible results for demos and local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAnalyzer;

impl SimulatedAnalyzer {
    fn simulate(timestamp: f64) -> AudioAnalysis {
        let mut rng = rand::thread_rng();
        let text = SAMPLE_UTTERANCES[rng.gen_range(0..SAMPLE_UTTERANCES.len())].to_string();
        let speaker = PANEL_SPEAKERS[rng.gen_range(0..PANEL_SPEAKERS.len())].to_string();

        AudioAnalysis {
            timestamp,
            transcription: Transcription {
                text: text.clone(),
                success: true,
            },
            diarization: Diarization {
                current_speaker: Some(speaker.clone()),
                confidence: rng.gen_range(0.7..0.95),
            },
            evaluation: Some(ChunkEvaluation {
                speaker,
                text,
                timestamp,
                score: f64::from(rng.gen_range(60u32..=90)),
                feedback: vec![
                    "좋은 답변입니다".to_string(),
                    "구체적인 경험을 잘 설명했습니다".to_string(),
                ],
                keywords: vec!["기술: 2개".to_string(), "경험: 1개".to_string()],
            }),
            success: true,
        }
    }
}

#[async_trait]
impl AudioAnalyzer for SimulatedAnalyzer {
    async fn analyze(&self, audio: &Path, timestamp: f64) -> Result<AudioAnalysis, AnalysisError> {
        tokio::fs::metadata(audio).await?;
        Ok(Self::simulate(timestamp))
    }
}
