//! Bus-facing handler for caption requests.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use vod_models::{Event, StartCensor, UpdateVideoStatus, VideoUploaded};
use vod_worker::{JobError, JobHandler};

use crate::processor::Processor;

pub struct CaptionsHandler {
    processor: Processor,
}

impl CaptionsHandler {
    pub fn new(processor: Processor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for CaptionsHandler {
    async fn handle(
        &self,
        body: &[u8],
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Event>, JobError> {
        let request: VideoUploaded = serde_json::from_slice(body)
            .map_err(|e| JobError::malformed(format!("invalid videoUploaded message: {}", e)))?;
        if request.video_id.trim().is_empty() || request.s3_key.trim().is_empty() {
            return Err(JobError::malformed("videoUploaded with empty videoId or s3Key"));
        }

        info!(
            video_id = %request.video_id,
            s3_key = %request.s3_key,
            "Received captions request"
        );

        let outcome = self
            .processor
            .process(&request, shutdown)
            .await
            .map_err(|e| JobError::failed(format!("captions {}: {}", request.video_id, e)))?;

        // A no-content run reports an empty key and does not start the
        // censor stage.
        Ok(match outcome.vtt_key {
            Some(vtt_key) => vec![
                StartCensor {
                    video_id: request.video_id.clone(),
                    s3_key: request.s3_key,
                    vtt_key: vtt_key.clone(),
                }
                .into(),
                UpdateVideoStatus::captions(request.video_id.as_str(), vtt_key).into(),
            ],
            None => vec![UpdateVideoStatus::captions(request.video_id.as_str(), "").into()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captions_request_shares_video_uploaded_schema() {
        let request: VideoUploaded =
            serde_json::from_slice(br#"{"videoId":"v1","s3Key":"clip.mp4"}"#).unwrap();
        assert_eq!(request.video_id, "v1");
    }
}
