//! S3 object-store adapter.
//!
//! This crate provides:
//! - Streaming upload/download of pipeline artifacts
//! - Multipart upload for large files, parallel ranged download
//! - HEAD existence/size checks and prefix listing

pub mod client;
pub mod error;

pub use client::{ObjectInfo, ObjectStore, StoreConfig};
pub use error::{StorageError, StorageResult};
