//! Gemini API client for content classification.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CensorError, CensorResult};

const MODEL: &str = "gemini-2.0-flash-001";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> CensorResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api_key: api_key.into(),
            client,
        })
    }

    /// Ask the model a yes/no question. Returns `true` iff the trimmed,
    /// lower-cased response body equals `"true"`.
    pub async fn classify(&self, prompt: &str) -> CensorResult<bool> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            MODEL, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 10,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(CensorError::llm_failed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: GeminiResponse = response.json().await?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| CensorError::llm_failed("no candidates returned"))?;

        debug!(response = text, "Gemini response");
        Ok(text.trim().to_lowercase() == "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_extraction() {
        let body: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":" True\n"}]}}]}"#,
        )
        .unwrap();
        let text = body.candidates[0].content.parts[0].text.as_str();
        assert_eq!(text.trim().to_lowercase(), "true");
    }

    #[test]
    fn empty_candidates_deserialize() {
        let body: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(body.candidates.is_empty());
    }
}
