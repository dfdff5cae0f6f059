//! Gemini Provider Implementation
//!
//! Integration with the Gemini `generateContent` REST API.
//!
//! The provider sends one prompt per call and hands back the first
//! candidate's text payload verbatim. Interpreting that payload (fence
//! stripping, schema checks) belongs to the extractor; this layer only
//! enforces the transport contract: HTTP 200, a well-formed envelope, and a
//! non-empty candidates array. There is deliberately no retry loop here -
//! retry and pacing policy live in the ingestion pipeline.
//!
//! # Examples
//!
//! ```no_run
//! use tallyman_llm::GeminiProvider;
//!
//! let provider = GeminiProvider::new("api-key", "gemini-2.5-flash-lite");
//! // generate() is async; the LlmProvider trait impl wraps it for
//! // synchronous callers
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tallyman_domain::traits::LlmProvider as LlmProviderTrait;

/// Default Gemini API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default timeout for classification requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gemini API provider for transaction classification
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

/// Request body for the generateContent API
#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

/// Response envelope from the generateContent API
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider against the public endpoint
    ///
    /// # Parameters
    ///
    /// - `api_key`: Gemini API key
    /// - `model`: Model to use (e.g., "gemini-2.5-flash-lite")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    /// Create a provider against a custom endpoint (test servers, proxies)
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Send a prompt to the classification service
    ///
    /// # Errors
    ///
    /// - [`LlmError::Transport`]: network failure or non-200 status
    /// - [`LlmError::Envelope`]: body did not parse as the response shape,
    ///   or the first candidate carried no text part
    /// - [`LlmError::EmptyCandidates`]: 200 response with no candidates
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Transport(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Envelope(format!("Failed to parse response: {}", e)))?;

        let candidate = envelope
            .candidates
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyCandidates)?;

        candidate
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
            .ok_or_else(|| LlmError::Envelope("Candidate carried no text part".to_string()))
    }
}

impl LlmProviderTrait for GeminiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        // Blocking wrapper for callers outside an async context
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| LlmError::Transport(format!("Runtime error: {}", e)))?;
        runtime.block_on(async { self.generate(prompt).await })
    }
}
