//! Shared data models for the vod pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Bus message schemas (upload requests, completion events, status updates)
//! - The rendition ladder
//! - Object-store key layout
//! - Segment filename conventions

pub mod chunk;
pub mod keys;
pub mod message;
pub mod rendition;

// Re-export common types
pub use chunk::{chunk_filename, chunk_number, sort_by_chunk_number};
pub use message::{Event, Phase, StartCensor, TranscodingComplete, UpdateVideoStatus, VideoUploaded};
pub use rendition::{RenditionSpec, RENDITIONS};
