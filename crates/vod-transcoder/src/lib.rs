//! Transcoder service: segmented encoding and streaming upload.

pub mod config;
pub mod encode;
pub mod error;
pub mod handler;
pub mod processor;
pub mod watcher;

pub use config::{TranscoderConfig, QUEUE, ROUTING_KEYS};
pub use error::{TranscodeError, TranscodeResult};
pub use handler::TranscodeHandler;
pub use processor::{Processor, TranscodeOutcome};
