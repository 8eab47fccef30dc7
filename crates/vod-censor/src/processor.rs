//! The censoring pipeline for one job.

use tracing::{info, warn};

use vod_storage::ObjectStore;

use crate::error::CensorResult;
use crate::gemini::GeminiClient;
use crate::prompt::{build_prompt, BLOCKED_WORDS};

/// Captions are classified in windows of this many code points. Splitting
/// on code points, not bytes, keeps multi-byte text intact.
const CHUNK_CODE_POINTS: usize = 5000;

/// Censor pipeline.
pub struct Processor {
    store: ObjectStore,
    llm: GeminiClient,
}

impl Processor {
    pub fn new(store: ObjectStore, llm: GeminiClient) -> Self {
        Self { store, llm }
    }

    /// Classify a caption file. Returns `true` as soon as any chunk is
    /// flagged. Per-chunk LLM errors are logged and skipped so one flaky
    /// call cannot fail the whole job.
    pub async fn process(&self, video_id: &str, vtt_key: &str) -> CensorResult<bool> {
        let captions = String::from_utf8_lossy(&self.store.download_bytes(vtt_key).await?)
            .into_owned();

        for (index, chunk) in split_code_point_chunks(&captions, CHUNK_CODE_POINTS)
            .iter()
            .enumerate()
        {
            let prompt = build_prompt(chunk, BLOCKED_WORDS);
            match self.llm.classify(&prompt).await {
                Ok(true) => {
                    info!(video_id, chunk = index, "Blocked content found");
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(video_id, chunk = index, "LLM check failed, skipping chunk: {}", e);
                }
            }
        }

        Ok(false)
    }
}

/// Split into consecutive chunks of at most `size` code points.
fn split_code_point_chunks(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_code_points_not_bytes() {
        // Three-byte characters; byte-based splitting would tear them.
        let text = "語".repeat(7);
        let chunks = split_code_point_chunks(&text, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 3);
        assert_eq!(chunks[2].chars().count(), 1);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = split_code_point_chunks(&"a".repeat(10), 5);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 5));
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_code_point_chunks("", 5000).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_code_point_chunks("WEBVTT", 5000);
        assert_eq!(chunks, vec!["WEBVTT".to_string()]);
    }
}
