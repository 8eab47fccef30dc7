//! Object-store key layout.
//!
//! Every artifact key is deterministic in `video_id` and rendition name, so
//! a redelivered job overwrites its own artifacts instead of duplicating
//! them. All key construction lives here; services never format keys inline.

/// Key of the uploaded source object.
pub fn original_key(original_prefix: &str, s3_key: &str) -> String {
    format!("{}/{}", original_prefix.trim_end_matches('/'), s3_key)
}

/// Prefix holding one rendition's init segment and chunks, no trailing slash.
pub fn rendition_prefix(transcoded_prefix: &str, video_id: &str, rendition: &str) -> String {
    format!(
        "{}/{}/{}",
        transcoded_prefix.trim_end_matches('/'),
        video_id,
        rendition
    )
}

/// Key of one file inside a rendition directory.
pub fn segment_key(
    transcoded_prefix: &str,
    video_id: &str,
    rendition: &str,
    filename: &str,
) -> String {
    format!(
        "{}/{}",
        rendition_prefix(transcoded_prefix, video_id, rendition),
        filename
    )
}

/// Key of a rendition's initialization segment.
pub fn init_key(transcoded_prefix: &str, video_id: &str, rendition: &str) -> String {
    segment_key(transcoded_prefix, video_id, rendition, "init.mp4")
}

/// Key of the ffmpeg-written per-rendition media playlist.
pub fn index_playlist_key(transcoded_prefix: &str, video_id: &str, rendition: &str) -> String {
    segment_key(transcoded_prefix, video_id, rendition, "index.m3u8")
}

/// Key of the transcoder's master playlist.
pub fn master_playlist_key(transcoded_prefix: &str, video_id: &str) -> String {
    format!(
        "{}/{}/master.m3u8",
        transcoded_prefix.trim_end_matches('/'),
        video_id
    )
}

/// Key of the poster frame.
pub fn poster_key(transcoded_prefix: &str, video_id: &str) -> String {
    format!(
        "{}/{}/thumbnails/poster.jpg",
        transcoded_prefix.trim_end_matches('/'),
        video_id
    )
}

/// Key of the WebVTT caption artifact.
pub fn caption_key(captions_prefix: &str, video_id: &str) -> String {
    format!("{}/{}.vtt", captions_prefix.trim_end_matches('/'), video_id)
}

/// Output key the transcription provider writes its JSON result to.
pub fn transcript_output_key(job_prefix: &str, job_name: &str) -> String {
    format!("{}/{}.json", job_prefix.trim_end_matches('/'), job_name)
}

/// Key of a packaged HLS media playlist.
pub fn hls_media_key(packaged_prefix: &str, video_id: &str, rendition: &str) -> String {
    format!(
        "{}/{}/hls/{}.m3u8",
        packaged_prefix.trim_end_matches('/'),
        video_id,
        rendition
    )
}

/// Key of the packaged HLS master playlist.
pub fn hls_master_key(packaged_prefix: &str, video_id: &str) -> String {
    format!(
        "{}/{}/hls/master.m3u8",
        packaged_prefix.trim_end_matches('/'),
        video_id
    )
}

/// Key of the packaged DASH manifest.
pub fn mpd_key(packaged_prefix: &str, video_id: &str) -> String {
    format!(
        "{}/{}/dash/master.mpd",
        packaged_prefix.trim_end_matches('/'),
        video_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_contract() {
        assert_eq!(original_key("originals", "clip.mp4"), "originals/clip.mp4");
        assert_eq!(
            segment_key("transcoded", "v1", "720p", "chunk_00000.m4s"),
            "transcoded/v1/720p/chunk_00000.m4s"
        );
        assert_eq!(init_key("transcoded", "v1", "720p"), "transcoded/v1/720p/init.mp4");
        assert_eq!(master_playlist_key("transcoded", "v1"), "transcoded/v1/master.m3u8");
        assert_eq!(
            poster_key("transcoded", "v1"),
            "transcoded/v1/thumbnails/poster.jpg"
        );
        assert_eq!(caption_key("captions/vtt", "v1"), "captions/vtt/v1.vtt");
        assert_eq!(
            transcript_output_key("captions/job", "caption-v1-17"),
            "captions/job/caption-v1-17.json"
        );
        assert_eq!(hls_media_key("packaged", "v1", "480p"), "packaged/v1/hls/480p.m3u8");
        assert_eq!(hls_master_key("packaged", "v1"), "packaged/v1/hls/master.m3u8");
        assert_eq!(mpd_key("packaged", "v1"), "packaged/v1/dash/master.mpd");
    }

    #[test]
    fn trailing_slashes_are_normalized() {
        assert_eq!(original_key("originals/", "clip.mp4"), "originals/clip.mp4");
        assert_eq!(
            rendition_prefix("transcoded/", "v1", "1080p"),
            "transcoded/v1/1080p"
        );
    }

    #[test]
    fn keys_are_deterministic() {
        // Same inputs, same key: redelivery overwrites rather than forks.
        let a = segment_key("transcoded", "v1", "1080p", "chunk_00004.m4s");
        let b = segment_key("transcoded", "v1", "1080p", "chunk_00004.m4s");
        assert_eq!(a, b);
    }
}
