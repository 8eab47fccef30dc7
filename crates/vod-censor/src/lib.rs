//! Censor service: LLM moderation over caption chunks.

pub mod config;
pub mod error;
pub mod gemini;
pub mod handler;
pub mod processor;
pub mod prompt;

pub use config::{CensorConfig, QUEUE, ROUTING_KEYS};
pub use error::{CensorError, CensorResult};
pub use gemini::GeminiClient;
pub use handler::CensorHandler;
pub use processor::Processor;
