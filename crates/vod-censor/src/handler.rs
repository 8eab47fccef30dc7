//! Bus-facing handler for censor requests.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use vod_models::{Event, StartCensor, UpdateVideoStatus};
use vod_worker::{JobError, JobHandler};

use crate::processor::Processor;

pub struct CensorHandler {
    processor: Processor,
}

impl CensorHandler {
    pub fn new(processor: Processor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for CensorHandler {
    async fn handle(
        &self,
        body: &[u8],
        _shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Event>, JobError> {
        let request: StartCensor = serde_json::from_slice(body)
            .map_err(|e| JobError::malformed(format!("invalid startCensor message: {}", e)))?;
        if request.video_id.trim().is_empty() {
            return Err(JobError::malformed("startCensor with empty VideoId"));
        }

        info!(
            video_id = %request.video_id,
            vtt_key = %request.vtt_key,
            "Received censor request"
        );

        // No captions were produced upstream; nothing can be flagged, but
        // the control plane still hears from this stage.
        if request.vtt_key.is_empty() {
            info!(video_id = %request.video_id, "No captions, skipping");
            return Ok(vec![
                UpdateVideoStatus::censor(request.video_id.as_str(), false).into(),
            ]);
        }

        let flagged = self
            .processor
            .process(&request.video_id, &request.vtt_key)
            .await
            .map_err(|e| JobError::failed(format!("censor {}: {}", request.video_id, e)))?;

        Ok(vec![
            UpdateVideoStatus::censor(request.video_id.as_str(), flagged).into()
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_censor_decodes_pascal_case() {
        let request: StartCensor = serde_json::from_slice(
            br#"{"VideoId":"v1","S3Key":"clip.mp4","VTTKey":"captions/vtt/v1.vtt"}"#,
        )
        .unwrap();
        assert_eq!(request.vtt_key, "captions/vtt/v1.vtt");
    }
}
