//! WebVTT conversion from provider transcript items.

use serde::Deserialize;

/// Transcript JSON as the provider writes it.
#[derive(Debug, Deserialize)]
pub struct Transcript {
    pub results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptResults {
    #[serde(default)]
    pub items: Vec<TranscriptItem>,
}

/// One timed token. `pronunciation` items carry a word with timing;
/// `punctuation` items carry a bare glyph.
#[derive(Debug, Deserialize)]
pub struct TranscriptItem {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
    pub content: String,
}

impl TranscriptItem {
    pub fn is_pronunciation(&self) -> bool {
        self.item_type == "pronunciation"
    }
}

/// Convert transcript items to a WebVTT document.
///
/// Consecutive pronunciation items accumulate into one cue running from the
/// first item's start to the last item's end; each punctuation item flushes
/// the cue, gluing its glyph onto the last word. Items with unparseable
/// times or empty alternatives are skipped.
pub fn to_webvtt(items: &[TranscriptItem]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    let mut words: Vec<String> = Vec::new();
    let mut start = 0.0f64;
    let mut end = 0.0f64;

    for item in items {
        let Some(alternative) = item.alternatives.first() else {
            continue;
        };
        if item.is_pronunciation() {
            let (Some(item_start), Some(item_end)) = (
                item.start_time.as_deref().and_then(parse_seconds),
                item.end_time.as_deref().and_then(parse_seconds),
            ) else {
                continue;
            };
            if words.is_empty() {
                start = item_start;
            }
            end = item_end;
            words.push(alternative.content.clone());
        } else if item.item_type == "punctuation" && !words.is_empty() {
            out.push_str(&format!(
                "{} --> {}\n{}{}\n\n",
                format_timestamp(start),
                format_timestamp(end),
                words.join(" "),
                alternative.content
            ));
            words.clear();
        }
    }

    if !words.is_empty() {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(start),
            format_timestamp(end),
            words.join(" ")
        ));
    }

    out
}

fn parse_seconds(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

/// `HH:MM:SS.mmm`, the WebVTT timestamp form. Rounds to whole milliseconds
/// so values like 2.4 don't truncate to .399.
fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(content: &str, start: &str, end: &str) -> TranscriptItem {
        TranscriptItem {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            alternatives: vec![Alternative {
                content: content.to_string(),
            }],
            item_type: "pronunciation".to_string(),
        }
    }

    fn punct(content: &str) -> TranscriptItem {
        TranscriptItem {
            start_time: None,
            end_time: None,
            alternatives: vec![Alternative {
                content: content.to_string(),
            }],
            item_type: "punctuation".to_string(),
        }
    }

    #[test]
    fn punctuation_flushes_cue_and_glues_glyph() {
        let items = vec![
            word("hello", "0.0", "0.5"),
            word("world", "0.6", "1.2"),
            punct("."),
            word("again", "2.0", "2.4"),
        ];
        let vtt = to_webvtt(&items);

        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:01.200\nhello world.\n"));
        assert!(vtt.contains("00:00:02.000 --> 00:00:02.400\nagain\n"));
    }

    #[test]
    fn timestamps_roll_over_minutes_and_hours() {
        let items = vec![word("late", "3725.250", "3726.000")];
        let vtt = to_webvtt(&items);
        assert!(vtt.contains("01:02:05.250 --> 01:02:06.000"));
    }

    #[test]
    fn unparseable_times_and_empty_alternatives_are_skipped() {
        let items = vec![
            TranscriptItem {
                start_time: Some("not-a-number".to_string()),
                end_time: Some("1.0".to_string()),
                alternatives: vec![Alternative {
                    content: "bad".to_string(),
                }],
                item_type: "pronunciation".to_string(),
            },
            TranscriptItem {
                start_time: Some("1.0".to_string()),
                end_time: Some("2.0".to_string()),
                alternatives: vec![],
                item_type: "pronunciation".to_string(),
            },
            word("good", "2.0", "2.5"),
        ];
        let vtt = to_webvtt(&items);
        assert!(!vtt.contains("bad"));
        assert!(vtt.contains("good"));
    }

    #[test]
    fn leading_punctuation_is_ignored() {
        let items = vec![punct("."), word("start", "0.0", "0.4")];
        let vtt = to_webvtt(&items);
        assert_eq!(vtt.matches("-->").count(), 1);
        assert!(vtt.contains("start\n"));
    }

    #[test]
    fn empty_items_produce_header_only() {
        assert_eq!(to_webvtt(&[]), "WEBVTT\n\n");
    }
}
