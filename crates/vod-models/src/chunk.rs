//! Segment filename conventions.
//!
//! The transcoder names CMAF fragments `chunk_NNNNN.m4s`; every consumer of
//! a segment listing recovers ordering from the embedded integer rather than
//! from lexicographic key order.

use std::sync::OnceLock;

use regex::Regex;

/// Format the segment filename for chunk `n`.
pub fn chunk_filename(n: u32) -> String {
    format!("chunk_{:05}.m4s", n)
}

fn chunk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Tolerates both `chunk_00001.m4s` and the underscore-less form some
    // packagers emit. Non-matching names sort to 0.
    RE.get_or_init(|| Regex::new(r"(?i)chunk_?(\d+)\.m4s$").expect("chunk regex"))
}

/// Extract the chunk index from a segment filename or full object key.
/// Returns 0 for names that do not carry one.
pub fn chunk_number(name: &str) -> u32 {
    chunk_re()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Sort segment keys ascending by chunk index. The sort is stable, so keys
/// without an index keep their listing order.
pub fn sort_by_chunk_number(keys: &mut [String]) {
    keys.sort_by_key(|k| chunk_number(k));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_inverts_formatter() {
        for n in [0u32, 1, 7, 99, 1234, 99_999] {
            assert_eq!(chunk_number(&chunk_filename(n)), n);
        }
    }

    #[test]
    fn extractor_handles_full_keys_and_case() {
        assert_eq!(chunk_number("transcoded/v1/720p/chunk_00042.m4s"), 42);
        assert_eq!(chunk_number("CHUNK_00003.M4S"), 3);
        assert_eq!(chunk_number("chunk00017.m4s"), 17);
    }

    #[test]
    fn non_matching_names_sort_to_zero() {
        assert_eq!(chunk_number("init.mp4"), 0);
        assert_eq!(chunk_number("segment_5.m4s"), 0);
    }

    #[test]
    fn sorting_is_numeric_not_lexicographic() {
        let mut keys = vec![
            "a/chunk_00010.m4s".to_string(),
            "a/chunk_00002.m4s".to_string(),
            "a/chunk_00001.m4s".to_string(),
        ];
        sort_by_chunk_number(&mut keys);
        assert_eq!(
            keys,
            vec![
                "a/chunk_00001.m4s".to_string(),
                "a/chunk_00002.m4s".to_string(),
                "a/chunk_00010.m4s".to_string(),
            ]
        );
    }
}
