//! Packager configuration.

use crate::error::{PackageError, PackageResult};

/// Queue this service consumes.
pub const QUEUE: &str = "packageRequest";
/// Routing keys bound to the queue.
pub const ROUTING_KEYS: &[&str] = &["transcodingComplete"];

/// Packager configuration.
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// Prefix the transcoder wrote segments under.
    pub transcoded_prefix: String,
    /// Prefix packaged manifests are written under.
    pub packaged_prefix: String,
    /// Absolute base URL playlist segment URIs are rooted at.
    pub cdn_base_url: String,
    /// Shell out to shaka-packager when available instead of synthesizing.
    pub use_external_packager: bool,
}

impl PackagerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PackageResult<Self> {
        Ok(Self {
            transcoded_prefix: std::env::var("TRANSCODED_PREFIX")
                .unwrap_or_else(|_| "transcoded".to_string()),
            packaged_prefix: std::env::var("PACKAGED_PREFIX")
                .map_err(|_| PackageError::config_error("PACKAGED_PREFIX not set"))?,
            cdn_base_url: std::env::var("CDN_BASE_URL")
                .map_err(|_| PackageError::config_error("CDN_BASE_URL not set"))?,
            use_external_packager: std::env::var("USE_EXTERNAL_PACKAGER")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
