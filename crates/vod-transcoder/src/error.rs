//! Transcoder error types.

use thiserror::Error;

pub type TranscodeResult<T> = Result<T, TranscodeError>;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("All renditions failed")]
    AllRenditionsFailed,

    #[error("Poster generation failed: {0}")]
    Poster(String),

    #[error("Segment upload failed: {0}")]
    SegmentUpload(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] vod_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vod_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
