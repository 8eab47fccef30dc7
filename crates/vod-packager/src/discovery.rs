//! Rendition discovery against the object store.

use tracing::warn;

use vod_models::chunk::sort_by_chunk_number;
use vod_models::{keys, RenditionSpec, RENDITIONS};
use vod_storage::ObjectStore;

use crate::error::PackageResult;

/// One rendition's artifacts as found in the store.
#[derive(Debug, Clone)]
pub struct RenditionArtifacts {
    pub spec: &'static RenditionSpec,
    /// Full segment keys, ascending by chunk index.
    pub segment_keys: Vec<String>,
}

/// Find the renditions the transcoder actually landed. A rendition is
/// present iff its prefix holds an `init.mp4` and at least one segment.
/// Missing rungs are skipped with a warning.
pub async fn discover_renditions(
    store: &ObjectStore,
    transcoded_prefix: &str,
    video_id: &str,
) -> PackageResult<Vec<RenditionArtifacts>> {
    let mut present = Vec::new();

    for spec in &RENDITIONS {
        let prefix = format!(
            "{}/",
            keys::rendition_prefix(transcoded_prefix, video_id, spec.name)
        );
        let objects = store.list_prefix(&prefix).await?;

        let mut has_init = false;
        let mut segment_keys = Vec::new();
        for obj in objects {
            let lower = obj.key.to_lowercase();
            if lower.ends_with("init.mp4") {
                has_init = true;
            } else if lower.ends_with(".m4s") {
                segment_keys.push(obj.key);
            }
        }

        if !has_init || segment_keys.is_empty() {
            warn!(
                video_id,
                rendition = spec.name,
                has_init,
                segments = segment_keys.len(),
                "Skipping missing rendition"
            );
            continue;
        }

        sort_by_chunk_number(&mut segment_keys);
        present.push(RenditionArtifacts { spec, segment_keys });
    }

    Ok(present)
}
