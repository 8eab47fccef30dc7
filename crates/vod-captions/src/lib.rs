//! Captions service: transcription orchestration and WebVTT conversion.

pub mod config;
pub mod error;
pub mod handler;
pub mod processor;
pub mod transcribe;
pub mod vtt;

pub use config::{CaptionsConfig, QUEUE, ROUTING_KEYS};
pub use error::{CaptionsError, CaptionsResult};
pub use handler::CaptionsHandler;
pub use processor::{CaptionsOutcome, Processor};
pub use transcribe::Transcriber;
