//! Transcription job orchestration.

use std::time::Duration;

use aws_sdk_transcribe::types::{LanguageCode, Media, Settings, TranscriptionJobStatus};
use aws_sdk_transcribe::Client;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{CaptionsError, CaptionsResult};

/// Poll cadence while a job is running.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Give up after this long.
const POLL_BUDGET_SECS: u64 = 1800;

/// Thin wrapper over the provider client.
pub struct Transcriber {
    client: Client,
}

impl Transcriber {
    /// Create a client from the ambient AWS configuration.
    pub async fn new() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// Submit a transcription job writing its JSON result to
    /// `output_key` in `output_bucket`.
    pub async fn start_job(
        &self,
        job_name: &str,
        media_uri: &str,
        output_bucket: &str,
        output_key: &str,
    ) -> CaptionsResult<()> {
        self.client
            .start_transcription_job()
            .transcription_job_name(job_name)
            .language_code(LanguageCode::EnUs)
            .media(Media::builder().media_file_uri(media_uri).build())
            .output_bucket_name(output_bucket)
            .output_key(output_key)
            .settings(
                Settings::builder()
                    .show_speaker_labels(false)
                    .show_alternatives(false)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| CaptionsError::transcribe(e.to_string()))?;

        info!(job_name, "Transcription job started");
        Ok(())
    }

    /// Poll until the job reaches a terminal state. Returns once the job
    /// completed; a provider-side failure or an exhausted budget is an
    /// error.
    pub async fn wait_for_job(
        &self,
        job_name: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> CaptionsResult<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(POLL_BUDGET_SECS);

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(CaptionsError::TranscriptionTimeout(POLL_BUDGET_SECS));
            }
            if *shutdown.borrow() {
                return Err(CaptionsError::Cancelled);
            }

            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = shutdown.changed() => continue,
            }

            let out = self
                .client
                .get_transcription_job()
                .transcription_job_name(job_name)
                .send()
                .await
                .map_err(|e| CaptionsError::transcribe(e.to_string()))?;

            let job = out
                .transcription_job()
                .ok_or_else(|| CaptionsError::transcribe("job missing from response"))?;

            match job.transcription_job_status() {
                Some(TranscriptionJobStatus::Completed) => {
                    info!(job_name, "Transcription completed");
                    return Ok(());
                }
                Some(TranscriptionJobStatus::Failed) => {
                    let reason = job
                        .failure_reason()
                        .unwrap_or("no failure reason reported")
                        .to_string();
                    return Err(CaptionsError::TranscriptionFailed(reason));
                }
                other => {
                    debug!(job_name, status = ?other, "Transcription in progress");
                }
            }
        }
    }
}
