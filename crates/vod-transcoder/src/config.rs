//! Transcoder configuration.

/// Queue this service consumes.
pub const QUEUE: &str = "transcodeRequest";
/// Routing keys bound to the queue.
pub const ROUTING_KEYS: &[&str] = &["videoUploaded"];

/// Transcoder configuration.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Prefix holding uploaded source objects.
    pub original_prefix: String,
    /// Prefix segments and playlists are written under.
    pub transcoded_prefix: String,
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
}

impl TranscoderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            original_prefix: std::env::var("ORIGINAL_PREFIX")
                .unwrap_or_else(|_| "uploads/originals".to_string()),
            transcoded_prefix: std::env::var("TRANSCODED_PREFIX")
                .unwrap_or_else(|_| "transcoded".to_string()),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
        }
    }
}
