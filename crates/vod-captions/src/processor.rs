//! The captioning pipeline for one job.

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use vod_models::{keys, VideoUploaded};
use vod_storage::ObjectStore;

use crate::config::CaptionsConfig;
use crate::error::{CaptionsError, CaptionsResult};
use crate::transcribe::Transcriber;
use crate::vtt::{self, Transcript};

/// Sources below this size cannot hold usable audio.
const MIN_SOURCE_BYTES: i64 = 1024;
/// A syntactically valid VTT with at least one cue is longer than this.
const MIN_VTT_BYTES: usize = 30;
/// Fewer pronounced words than this and no artifact is produced.
const MIN_WORDS: usize = 3;

const VTT_CONTENT_TYPE: &str = "text/vtt";
const VTT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// What a successful captions run hands back for events.
#[derive(Debug)]
pub struct CaptionsOutcome {
    /// The caption artifact key, or `None` for a no-content success
    /// (silent or near-silent source).
    pub vtt_key: Option<String>,
}

/// Captions pipeline.
pub struct Processor {
    config: CaptionsConfig,
    store: ObjectStore,
    transcriber: Transcriber,
}

impl Processor {
    pub fn new(config: CaptionsConfig, store: ObjectStore, transcriber: Transcriber) -> Self {
        Self {
            config,
            store,
            transcriber,
        }
    }

    /// Transcribe the source, convert to WebVTT, upload.
    pub async fn process(
        &self,
        request: &VideoUploaded,
        shutdown: watch::Receiver<bool>,
    ) -> CaptionsResult<CaptionsOutcome> {
        let video_id = &request.video_id;
        let source_key = keys::original_key(&self.config.original_prefix, &request.s3_key);

        let size = self
            .store
            .head(&source_key)
            .await?
            .ok_or_else(|| CaptionsError::SourceMissing(source_key.clone()))?;
        if size < MIN_SOURCE_BYTES {
            return Err(CaptionsError::SourceTooSmall {
                key: source_key,
                size,
            });
        }

        let job_name = format!("caption-{}-{}", video_id, Utc::now().timestamp());
        let json_key = keys::transcript_output_key(&self.config.transcriber_job_prefix, &job_name);
        let media_uri = format!("s3://{}/{}", self.store.bucket(), source_key);

        self.transcriber
            .start_job(&job_name, &media_uri, self.store.bucket(), &json_key)
            .await?;
        self.transcriber.wait_for_job(&job_name, shutdown).await?;

        let transcript: Transcript =
            serde_json::from_slice(&self.store.download_bytes(&json_key).await?)?;
        let items = transcript.results.items;

        let word_count = items.iter().filter(|i| i.is_pronunciation()).count();
        if word_count < MIN_WORDS {
            // Silent or near-silent source: succeed without an artifact so
            // the delivery is not retried forever.
            info!(video_id, word_count, "Transcript too short, no caption artifact");
            return Ok(CaptionsOutcome { vtt_key: None });
        }

        let vtt = vtt::to_webvtt(&items);
        if vtt.len() < MIN_VTT_BYTES {
            return Err(CaptionsError::OutputTooShort(vtt.len()));
        }

        let vtt_key = keys::caption_key(&self.config.captions_prefix, video_id);
        self.store
            .upload_bytes(
                vtt.into_bytes(),
                &vtt_key,
                VTT_CONTENT_TYPE,
                VTT_CACHE_CONTROL,
            )
            .await?;

        info!(video_id, vtt_key = %vtt_key, words = word_count, "Uploaded captions");
        Ok(CaptionsOutcome {
            vtt_key: Some(vtt_key),
        })
    }
}
