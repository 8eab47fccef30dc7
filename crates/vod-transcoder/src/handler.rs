//! Bus-facing handler for transcode requests.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use vod_models::{Event, TranscodingComplete, UpdateVideoStatus, VideoUploaded};
use vod_worker::{JobError, JobHandler};

use crate::processor::Processor;

pub struct TranscodeHandler {
    processor: Processor,
}

impl TranscodeHandler {
    pub fn new(processor: Processor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for TranscodeHandler {
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
            "Received transcode request"
        );

        let outcome = self
            .processor
            .process(&request, shutdown)
            .await
            .map_err(|e| JobError::failed(format!("transcode {}: {}", request.video_id, e)))?;

        Ok(vec![
            UpdateVideoStatus::transcode(
                request.video_id.as_str(),
                outcome.master_key,
                outcome.poster_key,
                outcome.duration,
            )
            .into(),
            TranscodingComplete {
                video_id: request.video_id,
            }
            .into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_worker::Disposition;

    #[test]
    fn decode_failure_is_poison() {
        let err = serde_json::from_slice::<VideoUploaded>(b"not json")
            .map_err(|e| JobError::malformed(e.to_string()))
            .unwrap_err();
        assert_eq!(err.disposition(), Disposition::Discard);
    }

    #[test]
    fn missing_field_fails_decode() {
        let result = serde_json::from_slice::<VideoUploaded>(br#"{"videoId":"v1"}"#);
        assert!(result.is_err());
    }
}
