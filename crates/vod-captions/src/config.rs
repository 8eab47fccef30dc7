//! Captions configuration.

/// Queue this service consumes.
pub const QUEUE: &str = "captionsRequest";
/// Routing keys bound to the queue.
pub const ROUTING_KEYS: &[&str] = &["videoUploaded"];

/// Captions configuration.
#[derive(Debug, Clone)]
pub struct CaptionsConfig {
    /// Prefix holding uploaded source objects.
    pub original_prefix: String,
    /// Prefix caption artifacts are written under.
    pub captions_prefix: String,
    /// Prefix the transcription provider writes its JSON output under.
    pub transcriber_job_prefix: String,
}

impl CaptionsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            original_prefix: std::env::var("ORIGINAL_PREFIX")
                .unwrap_or_else(|_| "uploads/originals".to_string()),
            captions_prefix: std::env::var("CAPTIONS_PREFIX")
                .unwrap_or_else(|_| "captions/vtt".to_string()),
            transcriber_job_prefix: std::env::var("TRANSCRIBER_JOB_PREFIX")
                .unwrap_or_else(|_| "captions/job".to_string()),
        }
    }
}
