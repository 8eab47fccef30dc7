//! Optional shaka-packager integration.
//!
//! When enabled and a packager binary is on the path, manifests are produced
//! by the external tool instead of being synthesized. Any failure here is
//! reported to the caller, which falls back to synthesis; this path is
//! best-effort by contract.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use vod_models::keys;
use vod_storage::ObjectStore;

use crate::discovery::RenditionArtifacts;
use crate::error::{PackageError, PackageResult};

/// Locate a shaka-packager binary.
pub fn find_binary() -> Option<PathBuf> {
    which::which("packager")
        .or_else(|_| which::which("shaka-packager"))
        .ok()
}

/// Drive the external packager over the discovered renditions and upload
/// whatever it produces under the packaged prefix.
pub async fn package(
    binary: &Path,
    store: &ObjectStore,
    transcoded_prefix: &str,
    packaged_prefix: &str,
    video_id: &str,
    renditions: &[RenditionArtifacts],
) -> PackageResult<()> {
    let staging = tempfile::tempdir()?;
    let out_dir = staging.path().join("out");
    tokio::fs::create_dir_all(&out_dir).await?;

    let mut args: Vec<String> = Vec::new();
    for rendition in renditions {
        let local = stage_rendition(store, transcoded_prefix, video_id, rendition, staging.path())
            .await?;
        args.push(format!(
            "input={},stream=video,output={},playlist_name={}.m3u8",
            local.display(),
            out_dir.join(format!("{}.mp4", rendition.spec.name)).display(),
            rendition.spec.name
        ));
    }
    if let Some(first) = renditions.first() {
        let local = staging.path().join(format!("{}.mp4", first.spec.name));
        args.push(format!(
            "input={},stream=audio,output={},playlist_name=audio.m3u8,hls_group_id=audio",
            local.display(),
            out_dir.join("audio.mp4").display()
        ));
    }
    args.push("--segment_duration".to_string());
    args.push("4".to_string());
    args.push("--hls_master_playlist_output".to_string());
    args.push(out_dir.join("master.m3u8").to_string_lossy().to_string());
    args.push("--mpd_output".to_string());
    args.push(out_dir.join("master.mpd").to_string_lossy().to_string());

    debug!("Running {} {}", binary.display(), args.join(" "));
    let output = Command::new(binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(PackageError::external(format!(
            "exit {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    upload_outputs(store, &out_dir, packaged_prefix, video_id).await?;
    info!(video_id, "External packager output uploaded");
    Ok(())
}

/// Reassemble one rendition into a single fMP4 the packager can read:
/// `init.mp4` followed by its fragments in chunk order.
async fn stage_rendition(
    store: &ObjectStore,
    transcoded_prefix: &str,
    video_id: &str,
    rendition: &RenditionArtifacts,
    staging: &Path,
) -> PackageResult<PathBuf> {
    let local = staging.join(format!("{}.mp4", rendition.spec.name));
    let mut file = tokio::fs::File::create(&local).await?;

    let init = store
        .download_bytes(&keys::init_key(transcoded_prefix, video_id, rendition.spec.name))
        .await?;
    file.write_all(&init).await?;
    for key in &rendition.segment_keys {
        let fragment = store.download_bytes(key).await?;
        file.write_all(&fragment).await?;
    }
    file.flush().await?;

    Ok(local)
}

async fn upload_outputs(
    store: &ObjectStore,
    out_dir: &Path,
    packaged_prefix: &str,
    video_id: &str,
) -> PackageResult<()> {
    let mut entries = tokio::fs::read_dir(out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let (key, content_type) = if name.ends_with(".mpd") {
            (
                format!("{}/{}/dash/{}", packaged_prefix, video_id, name),
                "application/dash+xml",
            )
        } else if name.ends_with(".m3u8") {
            (
                format!("{}/{}/hls/{}", packaged_prefix, video_id, name),
                "application/vnd.apple.mpegurl",
            )
        } else {
            (
                format!("{}/{}/hls/{}", packaged_prefix, video_id, name),
                "video/mp4",
            )
        };
        store
            .upload_file(entry.path(), &key, content_type, "public, max-age=3600")
            .await?;
    }
    Ok(())
}
