//! Packager error types.

use thiserror::Error;

pub type PackageResult<T> = Result<T, PackageError>;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No renditions available for packaging")]
    NoRenditions,

    #[error("External packager failed: {0}")]
    ExternalPackager(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vod_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalPackager(msg.into())
    }
}
