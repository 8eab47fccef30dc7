//! Poster frame extraction.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Fraction into the video the poster frame is taken from.
const POSTER_SEEK_FRACTION: f64 = 0.25;
/// Poster width; height follows the source aspect ratio.
const POSTER_SCALE: &str = "scale=1280:-1";

/// Extract a poster JPEG from a quarter of the way into the video.
pub async fn extract_poster(
    ffmpeg_path: &str,
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    duration_secs: f64,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video_path.as_ref(), output_path.as_ref())
        .seek(POSTER_SEEK_FRACTION * duration_secs)
        .single_frame()
        .video_filter(POSTER_SCALE)
        .output_arg("-q:v")
        .output_arg("2");

    FfmpegRunner::new(ffmpeg_path).run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poster_args_seek_to_quarter() {
        let cmd = FfmpegCommand::new("in.mp4", "poster.jpg")
            .seek(POSTER_SEEK_FRACTION * 100.0)
            .single_frame()
            .video_filter(POSTER_SCALE)
            .output_arg("-q:v")
            .output_arg("2");
        let args = cmd.build_args();

        assert!(args.contains(&"25.000".to_string()));
        assert!(args.contains(&"scale=1280:-1".to_string()));
        assert!(args.contains(&"-q:v".to_string()));
    }
}
