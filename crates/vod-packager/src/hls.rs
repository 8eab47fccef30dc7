//! HLS playlist synthesis.

use vod_models::{keys, RenditionSpec};

use crate::discovery::RenditionArtifacts;

/// Advertised segment duration in seconds.
pub const TARGET_DURATION: u32 = 4;

/// Media playlist for one rendition. Segment URIs are absolute against the
/// CDN so the playlist can live under a different prefix than the segments.
pub fn build_media_playlist(
    cdn_base_url: &str,
    transcoded_prefix: &str,
    video_id: &str,
    rendition: &RenditionArtifacts,
) -> String {
    let cdn = cdn_base_url.trim_end_matches('/');
    let init = keys::init_key(transcoded_prefix, video_id, rendition.spec.name);

    let mut out = String::new();
    out.push_str("#EXTM3U\n");
    out.push_str("#EXT-X-VERSION:7\n");
    out.push_str("#EXT-X-PLAYLIST-TYPE:VOD\n");
    out.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");
    out.push_str(&format!("#EXT-X-TARGETDURATION:{}\n", TARGET_DURATION));
    out.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
    out.push_str(&format!("#EXT-X-MAP:URI=\"{}/{}\"\n", cdn, init));

    for key in &rendition.segment_keys {
        out.push_str(&format!("#EXTINF:{}.000,\n", TARGET_DURATION));
        out.push_str(&format!("{}/{}\n", cdn, key));
    }
    out.push_str("#EXT-X-ENDLIST\n");
    out
}

/// Master playlist over the present renditions. Media playlist URIs are
/// relative siblings.
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
        out.push_str(&format!("{}.m3u8\n", spec.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_models::RENDITIONS;

    fn artifacts(spec: &'static RenditionSpec, count: u32) -> RenditionArtifacts {
        RenditionArtifacts {
            spec,
            segment_keys: (0..count)
                .map(|n| {
                    keys::segment_key(
                        "transcoded",
                        "v1",
                        spec.name,
                        &vod_models::chunk_filename(n),
                    )
                })
                .collect(),
        }
    }

    /// Parse the rendition set back out of a master playlist.
    fn parse_master(playlist: &str) -> Vec<(u64, String, String)> {
        let re = regex::Regex::new(
            r#"#EXT-X-STREAM-INF:BANDWIDTH=(\d+),RESOLUTION=([0-9x]+),CODECS="[^"]+"\n(\S+)"#,
        )
        .unwrap();
        re.captures_iter(playlist)
            .map(|c| (c[1].parse().unwrap(), c[2].to_string(), c[3].to_string()))
            .collect()
    }

    #[test]
    fn master_round_trips_rendition_set() {
        let given = [&RENDITIONS[0], &RENDITIONS[1], &RENDITIONS[2]];
        let parsed = parse_master(&build_master_playlist(&given));

        assert_eq!(parsed.len(), given.len());
        for (spec, (bandwidth, resolution, uri)) in given.iter().zip(&parsed) {
            assert_eq!(*bandwidth, spec.bandwidth as u64);
            assert_eq!(*resolution, spec.resolution());
            assert_eq!(*uri, format!("{}.m3u8", spec.name));
        }
    }

    #[test]
    fn master_with_single_rendition() {
        let playlist = build_master_playlist(&[&RENDITIONS[1]]);
        assert_eq!(parse_master(&playlist).len(), 1);
    }

    #[test]
    fn media_playlist_structure() {
        let playlist =
            build_media_playlist("https://cdn.example.com/", "transcoded", "v1", &artifacts(&RENDITIONS[2], 3));

        assert!(playlist.starts_with("#EXTM3U\n"));
        assert!(playlist.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
        assert!(playlist.contains(
            "#EXT-X-MAP:URI=\"https://cdn.example.com/transcoded/v1/480p/init.mp4\""
        ));
        assert!(playlist.ends_with("#EXT-X-ENDLIST\n"));
        assert_eq!(playlist.matches("#EXTINF:4.000,").count(), 3);
    }

    #[test]
    fn media_playlist_lists_segments_in_ascending_order() {
        let playlist =
            build_media_playlist("https://cdn", "transcoded", "v1", &artifacts(&RENDITIONS[0], 12));

        let positions: Vec<usize> = (0..12)
            .map(|n| {
                playlist
                    .find(&vod_models::chunk_filename(n))
                    .expect("segment listed")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
