//! MP4 box walk for codec discovery.
//!
//! Parses a rendition's `init.mp4` just far enough to recover the RFC 6381
//! codec strings and the audio sampling rate. Graceful degradation is the
//! contract: any malformed, truncated or unexpected structure yields the
//! constant defaults and the playlists stay emittable.

/// Codec information extracted from an initialization segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_sample_rate: u32,
}

impl Default for CodecInfo {
    fn default() -> Self {
        Self {
            video_codec: "avc1.64001e".to_string(),
            audio_codec: "mp4a.40.2".to_string(),
            audio_sample_rate: 48_000,
        }
    }
}

/// Iterator over sibling boxes in a byte slice.
struct BoxReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoxReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for BoxReader<'a> {
    type Item = ([u8; 4], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.len() < 8 {
            return None;
        }
        let size = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let box_type = [rest[4], rest[5], rest[6], rest[7]];
        // Size 0 ("to end of file") and 1 (64-bit size) never appear in the
        // tiny init segments ffmpeg writes; treat them as malformed.
        if size < 8 || size > rest.len() {
            return None;
        }
        let body = &rest[8..size];
        self.pos += size;
        Some((box_type, body))
    }
}

/// Extract codec information from an `init.mp4` payload. Never fails; every
/// field falls back to its default when the walk comes up empty.
pub fn parse_codecs(data: &[u8]) -> CodecInfo {
    let mut info = CodecInfo::default();

    for (box_type, body) in BoxReader::new(data) {
        if &box_type == b"moov" {
            parse_moov(body, &mut info);
            break;
        }
    }

    info
}

fn parse_moov(data: &[u8], info: &mut CodecInfo) {
    for (box_type, body) in BoxReader::new(data) {
        if &box_type == b"trak" {
            parse_trak(body, info);
        }
    }
}

fn parse_trak(data: &[u8], info: &mut CodecInfo) {
    for (box_type, body) in BoxReader::new(data) {
        if &box_type == b"mdia" {
            parse_mdia(body, info);
        }
    }
}

fn parse_mdia(data: &[u8], info: &mut CodecInfo) {
    for (box_type, body) in BoxReader::new(data) {
        match &box_type {
            b"mdhd" => {
                // version/flags (4), creation/modification times (8), then
                // the timescale. Audio tracks carry the sample rate here;
                // video timescales land outside the accepted window.
                if body.len() >= 20 {
                    let timescale =
                        u32::from_be_bytes([body[12], body[13], body[14], body[15]]);
                    if timescale > 1000 && timescale <= 48_000 {
                        info.audio_sample_rate = timescale;
                    }
                }
            }
            b"minf" => parse_minf(body, info),
            _ => {}
        }
    }
}

fn parse_minf(data: &[u8], info: &mut CodecInfo) {
    for (box_type, body) in BoxReader::new(data) {
        if &box_type == b"stbl" {
            parse_stbl(body, info);
        }
    }
}

fn parse_stbl(data: &[u8], info: &mut CodecInfo) {
    for (box_type, body) in BoxReader::new(data) {
        if &box_type == b"stsd" {
            parse_stsd(body, info);
        }
    }
}

fn parse_stsd(data: &[u8], info: &mut CodecInfo) {
    // Skip version, flags and entry count.
    let Some(entries) = data.get(8..) else {
        return;
    };
    for (box_type, body) in BoxReader::new(entries) {
        match &box_type {
            b"avc1" | b"avc3" => {
                if let Some(codec) = parse_avc_sample_entry(body) {
                    info.video_codec = codec;
                }
            }
            b"mp4a" => {
                if let Some(codec) = parse_mp4a_sample_entry(body) {
                    info.audio_codec = codec;
                }
            }
            _ => {}
        }
    }
}

/// `avc1.<profile><compat><level>` from the avcC child of a visual sample
/// entry. The 78-byte skip covers the fixed VisualSampleEntry fields.
fn parse_avc_sample_entry(data: &[u8]) -> Option<String> {
    let children = data.get(78..)?;
    for (box_type, body) in BoxReader::new(children) {
        if &box_type == b"avcC" && body.len() >= 4 {
            return Some(format!(
                "avc1.{:02x}{:02x}{:02x}",
                body[1], body[2], body[3]
            ));
        }
    }
    None
}

/// `mp4a.40.2` when the esds elementary stream descriptor advertises the
/// AAC audio object type. The 28-byte skip covers the AudioSampleEntry
/// fields. The descriptor scan is deliberately loose; a full ESDS parse
/// buys nothing over the fallback.
fn parse_mp4a_sample_entry(data: &[u8]) -> Option<String> {
    let children = data.get(28..)?;
    for (box_type, body) in BoxReader::new(children) {
        if &box_type == b"esds" && body.len() >= 5 && body.contains(&0x40) {
            return Some("mp4a.40.2".to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(box_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(&((body.len() as u32 + 8).to_be_bytes()));
        out.extend_from_slice(box_type);
        out.extend_from_slice(body);
        out
    }

    fn mdhd_with_timescale(timescale: u32) -> Vec<u8> {
        let mut body = vec![0u8; 20];
        body[12..16].copy_from_slice(&timescale.to_be_bytes());
        boxed(b"mdhd", &body)
    }

    fn avc1_with_avcc(profile: u8, compat: u8, level: u8) -> Vec<u8> {
        let mut body = vec![0u8; 78];
        body.extend_from_slice(&boxed(b"avcC", &[1, profile, compat, level, 0xff]));
        boxed(b"avc1", &body)
    }

    fn mp4a_with_esds(object_type: u8) -> Vec<u8> {
        let mut body = vec![0u8; 28];
        body.extend_from_slice(&boxed(b"esds", &[0, 0, 0, 0, 3, object_type, 0x05]));
        boxed(b"mp4a", &body)
    }

    fn init_segment(tracks: Vec<Vec<u8>>) -> Vec<u8> {
        let mut moov_body = Vec::new();
        for track in tracks {
            moov_body.extend_from_slice(&track);
        }
        let mut out = boxed(b"ftyp", b"isom");
        out.extend_from_slice(&boxed(b"moov", &moov_body));
        out
    }

    fn video_track(profile: u8, compat: u8, level: u8) -> Vec<u8> {
        let stsd = {
            let mut body = vec![0u8; 8];
            body.extend_from_slice(&avc1_with_avcc(profile, compat, level));
            boxed(b"stsd", &body)
        };
        let stbl = boxed(b"stbl", &stsd);
        let minf = boxed(b"minf", &stbl);
        let mdia = boxed(b"mdia", &minf);
        boxed(b"trak", &mdia)
    }

    fn audio_track(timescale: u32, object_type: u8) -> Vec<u8> {
        let stsd = {
            let mut body = vec![0u8; 8];
            body.extend_from_slice(&mp4a_with_esds(object_type));
            boxed(b"stsd", &body)
        };
        let stbl = boxed(b"stbl", &stsd);
        let minf = boxed(b"minf", &stbl);
        let mut mdia_body = mdhd_with_timescale(timescale);
        mdia_body.extend_from_slice(&minf);
        let mdia = boxed(b"mdia", &mdia_body);
        boxed(b"trak", &mdia)
    }

    #[test]
    fn extracts_video_codec_string() {
        let data = init_segment(vec![video_track(0x64, 0x00, 0x28)]);
        let info = parse_codecs(&data);
        assert_eq!(info.video_codec, "avc1.640028");
    }

    #[test]
    fn extracts_audio_codec_and_sample_rate() {
        let data = init_segment(vec![audio_track(44_100, 0x40)]);
        let info = parse_codecs(&data);
        assert_eq!(info.audio_codec, "mp4a.40.2");
        assert_eq!(info.audio_sample_rate, 44_100);
    }

    #[test]
    fn esds_without_aac_object_type_keeps_default() {
        let data = init_segment(vec![audio_track(44_100, 0x21)]);
        let info = parse_codecs(&data);
        assert_eq!(info.audio_codec, "mp4a.40.2");
    }

    #[test]
    fn video_timescale_outside_window_is_ignored() {
        // 90000 is a typical video track timescale; it must not be mistaken
        // for a sample rate.
        let mut body = vec![0u8; 20];
        body[12..16].copy_from_slice(&90_000u32.to_be_bytes());
        let mdia = boxed(b"mdia", &boxed(b"mdhd", &body));
        let data = init_segment(vec![boxed(b"trak", &mdia)]);
        let info = parse_codecs(&data);
        assert_eq!(info.audio_sample_rate, 48_000);
    }

    #[test]
    fn garbage_input_falls_back_to_defaults() {
        for data in [&b""[..], &b"\x00\x00"[..], &[0xffu8; 64][..]] {
            assert_eq!(parse_codecs(data), CodecInfo::default());
        }
    }

    #[test]
    fn truncated_box_stops_walk_without_panic() {
        let mut data = init_segment(vec![video_track(0x42, 0xc0, 0x1e)]);
        data.truncate(data.len() / 2);
        // Whatever survives truncation, parsing must not panic.
        let _ = parse_codecs(&data);
    }
}
