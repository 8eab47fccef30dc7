//! FFprobe duration probing.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a container's duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "ffprobe exited with non-zero status".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::InvalidVideo("format.duration missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parses_from_probe_json() {
        let probe: FfprobeOutput =
            serde_json::from_str(r#"{"format":{"duration":"10.533333"}}"#).unwrap();
        let duration = probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap();
        assert!((duration - 10.533333).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_is_detected() {
        let probe: FfprobeOutput = serde_json::from_str(r#"{"format":{}}"#).unwrap();
        assert!(probe.format.duration.is_none());
    }
}
