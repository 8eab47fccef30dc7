//! Censor configuration.

use crate::error::{CensorError, CensorResult};

/// Queue this service consumes.
pub const QUEUE: &str = "censorRequest";
/// Routing keys bound to the queue.
pub const ROUTING_KEYS: &[&str] = &["startCensor"];

/// Censor configuration.
#[derive(Debug, Clone)]
pub struct CensorConfig {
    /// LLM credential.
    pub google_api_key: String,
    /// Control-plane connection string. Validated at startup as part of the
    /// deployment contract; the pipeline itself stores nothing.
    pub database_url: String,
}

impl CensorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> CensorResult<Self> {
        Ok(Self {
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .map_err(|_| CensorError::config_error("GOOGLE_API_KEY not set"))?,
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| CensorError::config_error("DATABASE_URL not set"))?,
        })
    }
}
