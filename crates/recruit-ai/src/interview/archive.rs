use super::session::FinalReport;

/// Destination for final reports once a session ends.
pub trait SessionArchive: Send + Sync {
    fn archive(&self, report: &FinalReport) -> Result<(), ArchiveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
