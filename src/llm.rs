//! Gemini text-generation client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::GeminiConfig;
use crate::http_client::build_client;
use crate::{MapQueryError, Result};

/// Remote text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`; `json` asks the model for a JSON-only reply
    async fn generate(&self, prompt: &str, json: bool) -> Result<String>;
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MapQueryError::config("Gemini API key not configured"))?;

        Ok(Self {
            // generation is not idempotent enough to retry blindly
            client: build_client(config.timeout_seconds, 0)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request URL; the key travels in the `x-goog-api-key` header
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Concatenated text of the first candidate
fn first_candidate_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(MapQueryError::api(format!("Gemini blocked the prompt: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| MapQueryError::api("Gemini returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(MapQueryError::api(format!(
            "Gemini returned an empty candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, json: bool) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(MapQueryError::validation("Prompt cannot be empty"));
        }

        let url = self.endpoint();
        debug!("Gemini request URL: {}", url);
        let start_time = Instant::now();

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: json.then_some("application/json"),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MapQueryError::api(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| MapQueryError::api(format!("Failed to parse Gemini response: {e}")))?;

        let text = first_candidate_text(body)?;
        info!(
            "Gemini generated {} chars in {:.3}s",
            text.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(GeminiClient::new(&GeminiConfig::default()).is_err());
    }

    #[test]
    fn test_endpoint() {
        let config = GeminiConfig {
            api_key: Some("secret".into()),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!client.endpoint().contains("secret"));
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 256,
                response_mime_type: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_first_candidate_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_blocked_and_empty_responses() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(first_candidate_text(blocked).unwrap_err().to_string().contains("SAFETY"));

        let empty: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(first_candidate_text(empty).unwrap_err().to_string().contains("MAX_TOKENS"));
    }
}
