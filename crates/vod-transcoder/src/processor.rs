//! The transcoding pipeline for one job.

use std::path::Path;

use tokio::sync::watch;
use tracing::{info, warn};

use vod_media::{extract_poster, probe_duration, FfmpegRunner, MediaError};
use vod_models::keys;
use vod_models::{RenditionSpec, VideoUploaded, RENDITIONS};
use vod_storage::ObjectStore;

use crate::config::TranscoderConfig;
use crate::encode;
use crate::error::{TranscodeError, TranscodeResult};
use crate::watcher::{watch_and_upload, SEGMENT_CACHE_CONTROL};

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
/// The master playlist may grow a rendition on re-transcode; cache briefly.
const MASTER_CACHE_CONTROL: &str = "public, max-age=3600";

/// What a successful transcode hands back for the status event.
#[derive(Debug)]
pub struct TranscodeOutcome {
    pub master_key: String,
    pub poster_key: String,
    pub duration: f64,
}

/// Transcoder pipeline.
pub struct Processor {
    config: TranscoderConfig,
    store: ObjectStore,
}

impl Processor {
    pub fn new(config: TranscoderConfig, store: ObjectStore) -> Self {
        Self { config, store }
    }

    /// Run the full pipeline: download, probe, poster, renditions, master
    /// playlist. Succeeds if at least one rendition lands.
    pub async fn process(
        &self,
        request: &VideoUploaded,
        shutdown: watch::Receiver<bool>,
    ) -> TranscodeResult<TranscodeOutcome> {
        let video_id = &request.video_id;

        let staging = tempfile::Builder::new()
            .prefix(&format!("transcoder-{}-", video_id))
            .tempdir()?;
        let input = staging.path().join("original_video");

        let original_key = keys::original_key(&self.config.original_prefix, &request.s3_key);
        self.store.download_file(&original_key, &input).await?;

        let duration = probe_duration(&input).await?;
        info!(video_id, duration, "Probed source");

        // Poster extraction runs alongside the renditions; its failure fails
        // the job, but only after the renditions have had their chance.
        let poster_key = keys::poster_key(&self.config.transcoded_prefix, video_id);
        let poster_task = {
            let store = self.store.clone();
            let ffmpeg = self.config.ffmpeg_path.clone();
            let input = input.clone();
            let key = poster_key.clone();
            let poster_local = staging.path().join("poster.jpg");
            tokio::spawn(async move {
                extract_poster(&ffmpeg, &input, &poster_local, duration)
                    .await
                    .map_err(|e| e.to_string())?;
                store
                    .upload_file(&poster_local, &key, "image/jpeg", SEGMENT_CACHE_CONTROL)
                    .await
                    .map_err(|e| e.to_string())
            })
        };

        // Renditions run sequentially: ffmpeg saturates the CPU on its own.
        let mut survivors: Vec<&RenditionSpec> = Vec::new();
        for spec in &RENDITIONS {
            match self
                .process_rendition(&input, staging.path(), video_id, spec, shutdown.clone())
                .await
            {
                Ok(()) => survivors.push(spec),
                Err(TranscodeError::Media(MediaError::Cancelled)) => {
                    return Err(TranscodeError::Cancelled)
                }
                Err(e) => {
                    warn!(video_id, rendition = spec.name, "Rendition failed: {}", e);
                }
            }
        }

        if survivors.is_empty() {
            return Err(TranscodeError::AllRenditionsFailed);
        }

        let master_key = keys::master_playlist_key(&self.config.transcoded_prefix, video_id);
        let master = encode::build_master_playlist(&survivors);
        self.store
            .upload_bytes(
                master.into_bytes(),
                &master_key,
                PLAYLIST_CONTENT_TYPE,
                MASTER_CACHE_CONTROL,
            )
            .await?;

        match poster_task.await {
            Ok(Ok(())) => {}
            Ok(Err(msg)) => return Err(TranscodeError::Poster(msg)),
            Err(join_err) => return Err(TranscodeError::Poster(join_err.to_string())),
        }

        info!(
            video_id,
            renditions = survivors.len(),
            master_key = %master_key,
            "Transcode complete"
        );

        Ok(TranscodeOutcome {
            master_key,
            poster_key,
            duration,
        })
    }

    /// Encode one rendition while streaming finished segments to the store,
    /// then promote its playlist and init segment.
    async fn process_rendition(
        &self,
        input: &Path,
        staging: &Path,
        video_id: &str,
        spec: &RenditionSpec,
        shutdown: watch::Receiver<bool>,
    ) -> TranscodeResult<()> {
        let rendition_dir = staging.join(spec.name);
        tokio::fs::create_dir_all(&rendition_dir).await?;

        let key_prefix =
            keys::rendition_prefix(&self.config.transcoded_prefix, video_id, spec.name);

        let (done_tx, done_rx) = watch::channel(false);
        let watcher = tokio::spawn(watch_and_upload(
            self.store.clone(),
            rendition_dir.clone(),
            key_prefix,
            done_rx,
        ));

        let cmd = encode::rendition_command(input, &rendition_dir, spec);
        let encode_result = FfmpegRunner::new(self.config.ffmpeg_path.clone())
            .with_cancel(shutdown)
            .run(&cmd)
            .await;

        let _ = done_tx.send(true);
        let uploaded = watcher.await??;

        // Only after the watcher settles: a failed encode should not leave
        // upload tasks dangling against a vanishing staging directory.
        encode_result?;

        // init.mp4 must be durable before the playlist that references it
        // goes live.
        self.store
            .upload_file(
                rendition_dir.join("init.mp4"),
                &keys::init_key(&self.config.transcoded_prefix, video_id, spec.name),
                "video/mp4",
                SEGMENT_CACHE_CONTROL,
            )
            .await?;
        self.store
            .upload_file(
                rendition_dir.join("index.m3u8"),
                &keys::index_playlist_key(&self.config.transcoded_prefix, video_id, spec.name),
                PLAYLIST_CONTENT_TYPE,
                SEGMENT_CACHE_CONTROL,
            )
            .await?;

        info!(
            video_id,
            rendition = spec.name,
            segments = uploaded,
            "Rendition complete"
        );
        Ok(())
    }
}
