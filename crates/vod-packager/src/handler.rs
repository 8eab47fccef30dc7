//! Bus-facing handler for packaging requests.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use vod_models::{Event, TranscodingComplete};
use vod_worker::{JobError, JobHandler};

use crate::processor::Processor;

pub struct PackageHandler {
    processor: Processor,
}

impl PackageHandler {
    pub fn new(processor: Processor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for PackageHandler {
    async fn handle(
        &self,
        body: &[u8],
        _shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Event>, JobError> {
        let request: TranscodingComplete = serde_json::from_slice(body).map_err(|e| {
            JobError::malformed(format!("invalid transcodingComplete message: {}", e))
        })?;
        if request.video_id.trim().is_empty() {
            return Err(JobError::malformed("transcodingComplete with empty VideoId"));
        }

        info!(video_id = %request.video_id, "Received package request");

        self.processor
            .process(&request.video_id)
            .await
            .map_err(|e| JobError::failed(format!("package {}: {}", request.video_id, e)))?;

        // The packager writes artifacts only; the control plane observes
        // them through the store.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_field_is_required() {
        assert!(serde_json::from_slice::<TranscodingComplete>(br#"{"VideoId":"v1"}"#).is_ok());
        assert!(serde_json::from_slice::<TranscodingComplete>(br#"{"videoId":"v1"}"#).is_err());
    }
}
