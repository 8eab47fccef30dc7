//! DASH MPD synthesis.

use vod_models::{chunk_number, keys};

use crate::discovery::RenditionArtifacts;
use crate::mp4::CodecInfo;

/// MPEG timescale used for SegmentList timing.
const TIMESCALE: u32 = 90_000;
/// Segment duration in timescale units (4 seconds).
const SEGMENT_DURATION: u32 = 360_000;

/// Build a static MPD over the present renditions.
///
/// Every segment is advertised as exactly 4 s; a source shorter than a
/// multiple of 4 s leaves the final segment short, which players tolerate.
/// The frame rate is asserted as 25 rather than probed; SegmentList timing
/// is explicit so players do not depend on it.
pub fn build_mpd(
    cdn_base_url: &str,
    transcoded_prefix: &str,
    video_id: &str,
    renditions: &[RenditionArtifacts],
    codecs: &CodecInfo,
) -> String {
    let cdn = cdn_base_url.trim_end_matches('/');
    let max_segments = renditions
        .iter()
        .map(|r| r.segment_keys.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<MPD xmlns=\"urn:mpeg:dash:schema:mpd:2011\" type=\"static\" \
         mediaPresentationDuration=\"PT{}S\" minBufferTime=\"PT4S\" \
         profiles=\"urn:mpeg:dash:profile:isoff-main:2011\">\n",
        max_segments * 4
    ));
    out.push_str("<Period>\n");

    // Video adaptation set: one representation per present rendition.
    out.push_str(
        "<AdaptationSet mimeType=\"video/mp4\" segmentAlignment=\"true\" \
         startWithSAP=\"1\" contentType=\"video\">\n",
    );
    for rendition in renditions {
        let spec = rendition.spec;
        out.push_str(&format!(
            "<Representation id=\"{}\" bandwidth=\"{}\" width=\"{}\" height=\"{}\" \
             codecs=\"{}\" frameRate=\"25\">\n",
            spec.name, spec.bandwidth, spec.width, spec.height, codecs.video_codec
        ));
        out.push_str(&format!(
            "<BaseURL>{}/{}/</BaseURL>\n",
            cdn,
            keys::rendition_prefix(transcoded_prefix, video_id, spec.name)
        ));
        push_segment_list(&mut out, &rendition.segment_keys);
        out.push_str("</Representation>\n");
    }
    out.push_str("</AdaptationSet>\n");

    // Audio adaptation set: the first rendition's segments carry the muxed
    // audio, which is identical across the ladder.
    out.push_str(
        "<AdaptationSet mimeType=\"audio/mp4\" segmentAlignment=\"true\" \
         contentType=\"audio\">\n",
    );
    if let Some(first) = renditions.first() {
        out.push_str(&format!(
            "<Representation id=\"audio\" bandwidth=\"128000\" \
             audioSamplingRate=\"{}\" codecs=\"{}\">\n",
            codecs.audio_sample_rate, codecs.audio_codec
        ));
        out.push_str(
            "<AudioChannelConfiguration \
             schemeIdUri=\"urn:mpeg:dash:23003:3:audio_channel_configuration:2011\" \
             value=\"2\"/>\n",
        );
        out.push_str(&format!(
            "<BaseURL>{}/{}/</BaseURL>\n",
            cdn,
            keys::rendition_prefix(transcoded_prefix, video_id, first.spec.name)
        ));
        push_segment_list(&mut out, &first.segment_keys);
        out.push_str("</Representation>\n");
    }
    out.push_str("</AdaptationSet>\n");

    out.push_str("</Period>\n");
    out.push_str("</MPD>\n");
    out
}

fn push_segment_list(out: &mut String, segment_keys: &[String]) {
    let start_number = segment_keys
        .first()
        .map(|k| chunk_number(k).max(1))
        .unwrap_or(1);

    out.push_str(&format!(
        "<SegmentList timescale=\"{}\" duration=\"{}\" startNumber=\"{}\">\n",
        TIMESCALE, SEGMENT_DURATION, start_number
    ));
    out.push_str("<Initialization sourceURL=\"init.mp4\"/>\n");
    for key in segment_keys {
        let filename = key.rsplit('/').next().unwrap_or(key);
        out.push_str(&format!("<SegmentURL media=\"{}\"/>\n", filename));
    }
    out.push_str("</SegmentList>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_models::{chunk_filename, RenditionSpec, RENDITIONS};

    fn artifacts(spec: &'static RenditionSpec, count: u32) -> RenditionArtifacts {
        RenditionArtifacts {
            spec,
            segment_keys: (0..count)
                .map(|n| keys::segment_key("transcoded", "v1", spec.name, &chunk_filename(n)))
                .collect(),
        }
    }

    #[derive(Debug, PartialEq)]
    struct ParsedRepresentation {
        id: String,
        bandwidth: u64,
        width: u32,
        height: u32,
        codecs: String,
        segment_count: usize,
    }

    /// Parse video representations back out of an MPD.
    fn parse_mpd(mpd: &str) -> Vec<ParsedRepresentation> {
        let rep_re = regex::Regex::new(
            r#"<Representation id="([^"]+)" bandwidth="(\d+)" width="(\d+)" height="(\d+)" codecs="([^"]+)" frameRate="25">"#,
        )
        .unwrap();
        let url_re = regex::Regex::new(r#"<SegmentURL media="[^"]+"/>"#).unwrap();

        let mut reps = Vec::new();
        let blocks: Vec<&str> = mpd.split("<Representation ").skip(1).collect();
        for block in blocks {
            let full = format!("<Representation {}", block);
            if let Some(c) = rep_re.captures(&full) {
                let body_end = full.find("</Representation>").unwrap_or(full.len());
                let segment_count = url_re.find_iter(&full[..body_end]).count();
                reps.push(ParsedRepresentation {
                    id: c[1].to_string(),
                    bandwidth: c[2].parse().unwrap(),
                    width: c[3].parse().unwrap(),
                    height: c[4].parse().unwrap(),
                    codecs: c[5].to_string(),
                    segment_count,
                });
            }
        }
        reps
    }

    #[test]
    fn mpd_round_trips_representations() {
        let renditions = vec![
            artifacts(&RENDITIONS[0], 5),
            artifacts(&RENDITIONS[1], 5),
            artifacts(&RENDITIONS[2], 4),
        ];
        let codecs = CodecInfo::default();
        let mpd = build_mpd("https://cdn", "transcoded", "v1", &renditions, &codecs);

        let parsed = parse_mpd(&mpd);
        assert_eq!(parsed.len(), 3);
        for (given, got) in renditions.iter().zip(&parsed) {
            assert_eq!(got.id, given.spec.name);
            assert_eq!(got.bandwidth, given.spec.bandwidth as u64);
            assert_eq!(got.width, given.spec.width);
            assert_eq!(got.height, given.spec.height);
            assert_eq!(got.codecs, codecs.video_codec);
            assert_eq!(got.segment_count, given.segment_keys.len());
        }
    }

    #[test]
    fn duration_follows_longest_rendition() {
        let renditions = vec![artifacts(&RENDITIONS[0], 7), artifacts(&RENDITIONS[1], 3)];
        let mpd = build_mpd("https://cdn", "t", "v1", &renditions, &CodecInfo::default());
        assert!(mpd.contains("mediaPresentationDuration=\"PT28S\""));
        assert!(mpd.contains("minBufferTime=\"PT4S\""));
    }

    #[test]
    fn start_number_is_clamped_to_one() {
        // chunk_00000 extracts to 0; DASH start numbers begin at 1.
        let renditions = vec![artifacts(&RENDITIONS[2], 2)];
        let mpd = build_mpd("https://cdn", "t", "v1", &renditions, &CodecInfo::default());
        assert!(mpd.contains("startNumber=\"1\""));
    }

    #[test]
    fn segment_list_timing_is_fixed() {
        let renditions = vec![artifacts(&RENDITIONS[2], 1)];
        let mpd = build_mpd("https://cdn", "t", "v1", &renditions, &CodecInfo::default());
        assert!(mpd.contains("timescale=\"90000\" duration=\"360000\""));
        assert!(mpd.contains("<Initialization sourceURL=\"init.mp4\"/>"));
    }

    #[test]
    fn audio_set_uses_first_rendition_segments() {
        let renditions = vec![artifacts(&RENDITIONS[1], 4), artifacts(&RENDITIONS[2], 2)];
        let mpd = build_mpd("https://cdn", "t", "v1", &renditions, &CodecInfo::default());
        assert!(mpd.contains("audioSamplingRate=\"48000\""));
        assert!(mpd.contains("<BaseURL>https://cdn/t/v1/720p/</BaseURL>"));
    }
}
