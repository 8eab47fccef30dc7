//! Rendition encode command construction.

use std::path::Path;

use vod_media::FfmpegCommand;
use vod_models::RenditionSpec;

/// Segment duration in seconds. Keyframes are forced onto the same grid so
/// every segment starts on an IDR frame.
pub const SEGMENT_SECONDS: u32 = 4;

/// Build the ffmpeg invocation producing one rendition as an HLS VOD
/// playlist with CMAF segments (`init.mp4` + `chunk_NNNNN.m4s`).
pub fn rendition_command(
    input: &Path,
    rendition_dir: &Path,
    spec: &RenditionSpec,
) -> FfmpegCommand {
    let segment_pattern = rendition_dir.join("chunk_%05d.m4s");

    FfmpegCommand::new(input, rendition_dir.join("index.m3u8"))
        // First video stream, first audio stream if present.
        .output_args(["-map", "0:v:0", "-map", "0:a:0?"])
        .video_filter(spec.scale_filter())
        .output_args([
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            &spec.crf.to_string(),
            "-maxrate",
            spec.max_bitrate,
            "-bufsize",
            spec.buf_size,
            "-pix_fmt",
            "yuv420p",
        ])
        // IDR at every segment boundary regardless of scene cuts.
        .output_args([
            "-sc_threshold",
            "0",
            "-force_key_frames",
            &format!("expr:gte(t,n_forced*{})", SEGMENT_SECONDS),
        ])
        .output_args(["-c:a", "aac", "-b:a", "128k", "-ac", "2", "-ar", "48000"])
        .output_args([
            "-f",
            "hls",
            "-hls_playlist_type",
            "vod",
            "-hls_time",
            &SEGMENT_SECONDS.to_string(),
            "-hls_flags",
            "independent_segments+temp_file",
            "-hls_segment_type",
            "fmp4",
            "-hls_fmp4_init_filename",
            "init.mp4",
            "-hls_segment_filename",
            &segment_pattern.to_string_lossy(),
        ])
}

/// Master playlist over the renditions that survived encoding. URIs are
/// relative to the playlist's own prefix.
pub fn build_master_playlist(renditions: &[&RenditionSpec]) -> String {
    let mut out = String::new();
    out.push_str("#EXTM3U\n");
    out.push_str("#EXT-X-VERSION:7\n");
    out.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");
    for spec in renditions {
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={},CODECS=\"avc1.640028\"\n",
            spec.bandwidth,
            spec.resolution()
        ));
        out.push_str(&format!("{}/index.m3u8\n", spec.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_models::RENDITIONS;

    #[test]
    fn rendition_command_carries_hls_fmp4_flags() {
        let cmd = rendition_command(
            Path::new("/staging/original_video"),
            Path::new("/staging/720p"),
            &RENDITIONS[1],
        );
        let args = cmd.build_args();

        for expected in [
            "libx264",
            "medium",
            "34",
            "3000k",
            "6000k",
            "yuv420p",
            "scale=1280:720",
            "expr:gte(t,n_forced*4)",
            "fmp4",
            "init.mp4",
            "independent_segments+temp_file",
        ] {
            assert!(
                args.iter().any(|a| a == expected),
                "missing {} in {:?}",
                expected,
                args
            );
        }
        assert!(args
            .iter()
            .any(|a| a.ends_with("720p/chunk_%05d.m4s")));
        assert!(args.last().unwrap().ends_with("720p/index.m3u8"));
    }

    #[test]
    fn master_playlist_lists_only_survivors() {
        let survivors = [&RENDITIONS[1], &RENDITIONS[2]];
        let playlist = build_master_playlist(&survivors);

        assert!(playlist.starts_with("#EXTM3U\n"));
        assert_eq!(playlist.matches("#EXT-X-STREAM-INF").count(), 2);
        assert!(playlist.contains("BANDWIDTH=3000000,RESOLUTION=1280x720"));
        assert!(playlist.contains("720p/index.m3u8"));
        assert!(!playlist.contains("1080p"));
    }

    #[test]
    fn master_playlist_single_rendition() {
        let survivors = [&RENDITIONS[0]];
        let playlist = build_master_playlist(&survivors);
        assert_eq!(playlist.matches("#EXT-X-STREAM-INF").count(), 1);
    }
}
