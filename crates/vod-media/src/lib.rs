//! FFmpeg/FFprobe subprocess plumbing.
//!
//! This crate provides:
//! - An argument builder and cancellable runner for ffmpeg
//! - Container duration probing via ffprobe
//! - Poster frame extraction

pub mod command;
pub mod error;
pub mod poster;
pub mod probe;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use poster::extract_poster;
pub use probe::probe_duration;
