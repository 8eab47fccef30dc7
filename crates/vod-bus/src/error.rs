//! Bus error types.

use thiserror::Error;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BusError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
