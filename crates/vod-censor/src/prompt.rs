//! Moderation prompt construction.

/// Words the pipeline flags. Process-constant; a deployment that needs a
/// different list redeploys.
pub const BLOCKED_WORDS: &[&str] = &["fuck", "bitch", "bastard", "dick", "slut", "whore"];

/// Build the yes/no moderation prompt for one caption chunk.
pub fn build_prompt(chunk: &str, blocked_words: &[&str]) -> String {
    format!(
        "You are a content moderation AI. Here is a list of censored words: {}. \
         Here is a chunk of a WebVTT subtitle file: \"\"\"\n{}\n\"\"\"\n\
         If any of the censored words appear in the subtitle chunk, reply with \"true\". \
         If none appear, reply with \"false\". Reply with only \"true\" or \"false\".",
        blocked_words.join(", "),
        chunk
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_blocklist_and_chunk() {
        let prompt = build_prompt("00:00:01.000 --> 00:00:02.000\nhello", BLOCKED_WORDS);
        assert!(prompt.contains("fuck, bitch"));
        assert!(prompt.contains("hello"));
        assert!(prompt.contains("only \"true\" or \"false\""));
    }
}
