//! Gemini `generateContent` client with JSON-constrained output

use std::time::Duration;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::content::ModelClient;
use crate::types::GenerationError;

pub const GEMINI_API: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: GEMINI_API.to_string(),
        })
    }

    /// Point at another host (proxies, local mocks)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn call(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError> {
        let body = request_body(prompt, schema);
        debug!(model = %self.model, prompt_len = prompt.len(), "generateContent");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed)
    }
}

impl ModelClient for GeminiClient {
    fn generate_json<'a>(&'a self, prompt: &'a str, schema: &'a Value) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(self.call(prompt, schema))
    }
}

pub(crate) fn request_body(prompt: &str, schema: &Value) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema
        }
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Text of the first part of the first candidate
pub(crate) fn extract_text(response: GenerateResponse) -> Result<String, GenerationError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let schema = json!({ "type": "OBJECT" });
        let body = request_body("hello", &schema);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_first_candidate_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"topic\":\"X\"}"}]}},{"content":{"parts":[{"text":"other"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(parsed).unwrap(), r#"{"topic":"X"}"#);
    }

    #[test]
    fn test_no_candidates_is_empty_response() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(matches!(extract_text(parsed), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(GeminiClient::new("  ", DEFAULT_MODEL, 30), Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("k", "gemini-test", 5).unwrap().with_base_url("http://localhost:9/");
        assert_eq!(client.endpoint(), "http://localhost:9/v1beta/models/gemini-test:generateContent");
    }
}
