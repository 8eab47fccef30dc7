//! Bus message schemas.
//!
//! Field casing is part of the wire contract: `videoUploaded` is produced by
//! the upload gateway with camelCase fields, everything downstream of it is
//! PascalCase. Renaming a field here breaks consumers silently, so every
//! struct pins its casing explicitly.

use serde::{Deserialize, Serialize};

/// Job message published by the gateway when a source upload lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUploaded {
    pub video_id: String,
    pub s3_key: String,
}

/// Published by the transcoder once all surviving renditions are durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscodingComplete {
    pub video_id: String,
}

/// Published by the captions service when a caption artifact exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartCensor {
    pub video_id: String,
    pub s3_key: String,
    #[serde(rename = "VTTKey")]
    pub vtt_key: String,
}

/// Pipeline stage carried in status events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Transcode,
    Captions,
    Censor,
}

/// Status event consumed by the control plane.
///
/// Phase-specific fields are optional and omitted from the payload when the
/// reporting stage did not produce them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateVideoStatus {
    pub video_id: String,
    pub phase: Phase,
    /// Transcode phase: key of the synthesized master playlist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_manifest_key: Option<String>,
    /// Transcode phase: key of the extracted poster frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_key: Option<String>,
    /// Transcode phase: source duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Captions phase: caption artifact key, empty when no captions exist.
    #[serde(rename = "VTTKey", skip_serializing_if = "Option::is_none")]
    pub vtt_key: Option<String>,
    /// Censor phase: whether blocked content was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub censor: Option<bool>,
}

impl UpdateVideoStatus {
    /// Status event for a completed transcode.
    pub fn transcode(
        video_id: impl Into<String>,
        master_manifest_key: impl Into<String>,
        poster_key: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            phase: Phase::Transcode,
            master_manifest_key: Some(master_manifest_key.into()),
            poster_key: Some(poster_key.into()),
            duration: Some(duration),
            vtt_key: None,
            censor: None,
        }
    }

    /// Status event for a completed captions run. `vtt_key` is the empty
    /// string when the transcript was too short to produce an artifact.
    pub fn captions(video_id: impl Into<String>, vtt_key: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            phase: Phase::Captions,
            master_manifest_key: None,
            poster_key: None,
            duration: None,
            vtt_key: Some(vtt_key.into()),
            censor: None,
        }
    }

    /// Status event for a completed censor run.
    pub fn censor(video_id: impl Into<String>, flagged: bool) -> Self {
        Self {
            video_id: video_id.into(),
            phase: Phase::Censor,
            master_manifest_key: None,
            poster_key: None,
            duration: None,
            vtt_key: None,
            censor: Some(flagged),
        }
    }
}

/// Outbound bus event.
///
/// One publish path parameterized by routing key; the payload enum replaces
/// a per-topic branch at the publish site.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Event {
    VideoUploaded(VideoUploaded),
    TranscodingComplete(TranscodingComplete),
    StartCensor(StartCensor),
    UpdateVideoStatus(UpdateVideoStatus),
}

impl Event {
    /// Routing key this event is published under.
    pub fn routing_key(&self) -> &'static str {
        match self {
            Event::VideoUploaded(_) => "videoUploaded",
            Event::TranscodingComplete(_) => "transcodingComplete",
            Event::StartCensor(_) => "startCensor",
            Event::UpdateVideoStatus(_) => "updateVideoStatus",
        }
    }

    /// Video id carried by the payload, for logging.
    pub fn video_id(&self) -> &str {
        match self {
            Event::VideoUploaded(e) => &e.video_id,
            Event::TranscodingComplete(e) => &e.video_id,
            Event::StartCensor(e) => &e.video_id,
            Event::UpdateVideoStatus(e) => &e.video_id,
        }
    }
}

impl From<VideoUploaded> for Event {
    fn from(e: VideoUploaded) -> Self {
        Event::VideoUploaded(e)
    }
}

impl From<TranscodingComplete> for Event {
    fn from(e: TranscodingComplete) -> Self {
        Event::TranscodingComplete(e)
    }
}

impl From<StartCensor> for Event {
    fn from(e: StartCensor) -> Self {
        Event::StartCensor(e)
    }
}

impl From<UpdateVideoStatus> for Event {
    fn from(e: UpdateVideoStatus) -> Self {
        Event::UpdateVideoStatus(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_uploaded_uses_camel_case() {
        let msg: VideoUploaded =
            serde_json::from_str(r#"{"videoId":"v1","s3Key":"clip.mp4"}"#).unwrap();
        assert_eq!(msg.video_id, "v1");
        assert_eq!(msg.s3_key, "clip.mp4");

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["s3Key"], "clip.mp4");
    }

    #[test]
    fn downstream_events_use_pascal_case() {
        let json = serde_json::to_value(Event::from(StartCensor {
            video_id: "v1".to_string(),
            s3_key: "clip.mp4".to_string(),
            vtt_key: "captions/vtt/v1.vtt".to_string(),
        }))
        .unwrap();
        assert_eq!(json["VideoId"], "v1");
        assert_eq!(json["S3Key"], "clip.mp4");
        assert_eq!(json["VTTKey"], "captions/vtt/v1.vtt");
    }

    #[test]
    fn status_event_omits_other_phases_fields() {
        let json =
            serde_json::to_value(UpdateVideoStatus::censor("v1", true)).unwrap();
        assert_eq!(json["Phase"], "censor");
        assert_eq!(json["Censor"], true);
        assert!(json.get("VTTKey").is_none());
        assert!(json.get("MasterManifestKey").is_none());
    }

    #[test]
    fn routing_keys_match_topology() {
        assert_eq!(
            Event::from(TranscodingComplete {
                video_id: "v".to_string()
            })
            .routing_key(),
            "transcodingComplete"
        );
        assert_eq!(
            Event::from(UpdateVideoStatus::captions("v", "")).routing_key(),
            "updateVideoStatus"
        );
    }
}
