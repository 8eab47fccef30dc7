//! Captions error types.

use thiserror::Error;

pub type CaptionsResult<T> = Result<T, CaptionsError>;

#[derive(Debug, Error)]
pub enum CaptionsError {
    #[error("Source object missing: {0}")]
    SourceMissing(String),

    #[error("Source object too small ({size} bytes): {key}")]
    SourceTooSmall { key: String, size: i64 },

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Transcription timed out after {0} seconds")]
    TranscriptionTimeout(u64),

    #[error("Transcribe API error: {0}")]
    Transcribe(String),

    #[error("Caption output too short ({0} bytes)")]
    OutputTooShort(usize),

    #[error("Cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] vod_storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptionsError {
    pub fn transcribe(msg: impl Into<String>) -> Self {
        Self::Transcribe(msg.into())
    }
}
