//! The packaging pipeline for one job.

use tracing::{info, warn};

use vod_models::keys;
use vod_storage::ObjectStore;

use crate::config::PackagerConfig;
use crate::discovery::discover_renditions;
use crate::error::{PackageError, PackageResult};
use crate::mp4::{parse_codecs, CodecInfo};
use crate::{dash, external, hls};

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const MPD_CONTENT_TYPE: &str = "application/dash+xml";
const MANIFEST_CACHE_CONTROL: &str = "public, max-age=3600";

/// Packager pipeline.
pub struct Processor {
    config: PackagerConfig,
    store: ObjectStore,
}

impl Processor {
    pub fn new(config: PackagerConfig, store: ObjectStore) -> Self {
        Self { config, store }
    }

    /// Package one video: discover renditions, then write HLS playlists and
    /// a DASH MPD under the packaged prefix.
    pub async fn process(&self, video_id: &str) -> PackageResult<()> {
        info!(video_id, "Packaging start");

        let renditions =
            discover_renditions(&self.store, &self.config.transcoded_prefix, video_id).await?;
        if renditions.is_empty() {
            return Err(PackageError::NoRenditions);
        }
        info!(video_id, renditions = renditions.len(), "Packaging with available renditions");

        if self.config.use_external_packager {
            match external::find_binary() {
                Some(binary) => {
                    match external::package(
                        &binary,
                        &self.store,
                        &self.config.transcoded_prefix,
                        &self.config.packaged_prefix,
                        video_id,
                        &renditions,
                    )
                    .await
                    {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            warn!(video_id, "External packager failed, synthesizing: {}", e)
                        }
                    }
                }
                None => warn!("External packager requested but not found on PATH"),
            }
        }

        // HLS: one media playlist per rendition plus the master.
        for rendition in &renditions {
            let playlist = hls::build_media_playlist(
                &self.config.cdn_base_url,
                &self.config.transcoded_prefix,
                video_id,
                rendition,
            );
            let key = keys::hls_media_key(&self.config.packaged_prefix, video_id, rendition.spec.name);
            self.store
                .upload_bytes(
                    playlist.into_bytes(),
                    &key,
                    PLAYLIST_CONTENT_TYPE,
                    MANIFEST_CACHE_CONTROL,
                )
                .await?;
            info!(video_id, key = %key, "Uploaded rendition playlist");
        }

        let specs: Vec<_> = renditions.iter().map(|r| r.spec).collect();
        let master_key = keys::hls_master_key(&self.config.packaged_prefix, video_id);
        self.store
            .upload_bytes(
                hls::build_master_playlist(&specs).into_bytes(),
                &master_key,
                PLAYLIST_CONTENT_TYPE,
                MANIFEST_CACHE_CONTROL,
            )
            .await?;
        info!(video_id, key = %master_key, "Uploaded master playlist");

        // DASH: codec discovery from the first present rendition's init
        // segment, falling back to constants on any parse trouble.
        let codecs = self.discover_codecs(video_id, renditions[0].spec.name).await;
        info!(
            video_id,
            video = %codecs.video_codec,
            audio = %codecs.audio_codec,
            sample_rate = codecs.audio_sample_rate,
            "Detected codecs"
        );

        let mpd = dash::build_mpd(
            &self.config.cdn_base_url,
            &self.config.transcoded_prefix,
            video_id,
            &renditions,
            &codecs,
        );
        let mpd_key = keys::mpd_key(&self.config.packaged_prefix, video_id);
        self.store
            .upload_bytes(
                mpd.into_bytes(),
                &mpd_key,
                MPD_CONTENT_TYPE,
                MANIFEST_CACHE_CONTROL,
            )
            .await?;
        info!(video_id, key = %mpd_key, "Uploaded MPD");

        info!(video_id, "Packaging complete");
        Ok(())
    }

    async fn discover_codecs(&self, video_id: &str, rendition: &str) -> CodecInfo {
        let init_key = keys::init_key(&self.config.transcoded_prefix, video_id, rendition);
        match self.store.download_bytes(&init_key).await {
            Ok(data) => parse_codecs(&data),
            Err(e) => {
                warn!(video_id, "Failed to read init segment, using default codecs: {}", e);
                CodecInfo::default()
            }
        }
    }
}
