//! Segment watcher: promote finished CMAF fragments to the object store
//! while ffmpeg is still encoding.
//!
//! The watcher polls the rendition directory instead of using fs
//! notifications; polling proved reliable across platforms where notify did
//! not. The `temp_file` hls flag makes ffmpeg write segments under a
//! temporary name and rename on close, so any `*.m4s` the poll sees is
//! complete.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use vod_storage::ObjectStore;

use crate::error::{TranscodeError, TranscodeResult};

/// Poll cadence for the rendition directory.
const POLL_INTERVAL: Duration = Duration::from_millis(300);
/// Extra polls after ffmpeg exits, to catch late renames.
const FINAL_POLLS: u32 = 6;

/// Segment cache policy: keys are content-immutable.
pub const SEGMENT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Watch `dir` for new `.m4s` files and upload each one under
/// `key_prefix/<filename>`, deleting the local copy after upload. Returns
/// the number of segments uploaded once the encoder is done and all uploads
/// have settled.
pub async fn watch_and_upload(
    store: ObjectStore,
    dir: PathBuf,
    key_prefix: String,
    mut encoder_done: watch::Receiver<bool>,
) -> TranscodeResult<usize> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut uploads: JoinSet<Result<(), String>> = JoinSet::new();

    loop {
        scan_once(&store, &dir, &key_prefix, &mut seen, &mut uploads).await?;
        if *encoder_done.borrow() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = encoder_done.changed() => {}
        }
    }

    // ffmpeg has exited; a rename can still land just after the last scan.
    for _ in 0..FINAL_POLLS {
        tokio::time::sleep(POLL_INTERVAL).await;
        scan_once(&store, &dir, &key_prefix, &mut seen, &mut uploads).await?;
    }

    let mut uploaded = 0usize;
    let mut failures = Vec::new();
    while let Some(result) = uploads.join_next().await {
        match result {
            Ok(Ok(())) => uploaded += 1,
            Ok(Err(msg)) => failures.push(msg),
            Err(join_err) => failures.push(join_err.to_string()),
        }
    }

    if let Some(first) = failures.first() {
        error!(
            failed = failures.len(),
            uploaded, "Segment uploads failed: {}", first
        );
        return Err(TranscodeError::SegmentUpload(first.clone()));
    }

    info!(segments = uploaded, "Segment uploads complete");
    Ok(uploaded)
}

/// One directory scan: spawn an upload for every previously-unseen segment.
async fn scan_once(
    store: &ObjectStore,
    dir: &Path,
    key_prefix: &str,
    seen: &mut HashSet<String>,
    uploads: &mut JoinSet<Result<(), String>>,
) -> TranscodeResult<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".m4s") || seen.contains(&name) {
            continue;
        }
        seen.insert(name.clone());

        let store = store.clone();
        let path = entry.path();
        let key = format!("{}/{}", key_prefix, name);
        uploads.spawn(async move {
            upload_segment(&store, &path, &key).await.map_err(|e| {
                format!("{}: {}", key, e)
            })
        });
    }
    Ok(())
}

async fn upload_segment(store: &ObjectStore, path: &Path, key: &str) -> TranscodeResult<()> {
    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("video/iso.segment");

    store
        .upload_file(path, key, content_type, SEGMENT_CACHE_CONTROL)
        .await?;

    tokio::fs::remove_file(path).await?;
    debug!(key, "Uploaded segment");
    Ok(())
}
