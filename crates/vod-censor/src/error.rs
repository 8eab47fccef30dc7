//! Censor error types.

use thiserror::Error;

pub type CensorResult<T> = Result<T, CensorError>;

#[derive(Debug, Error)]
pub enum CensorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("LLM request failed: {0}")]
    LlmFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vod_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CensorError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn llm_failed(msg: impl Into<String>) -> Self {
        Self::LlmFailed(msg.into())
    }
}
