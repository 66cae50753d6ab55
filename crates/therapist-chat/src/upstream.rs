//! Upstream generative-language client.
//!
//! [`GenerativeModel`] is the seam the orchestrator talks to;
//! [`GeminiClient`] implements it against the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use therapist_core::config::UpstreamConfig;

use crate::error::ChatError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// A text generator that answers a single prompt.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the text of the first candidate part.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Pull `candidates[0].content.parts[0].text` out of a raw response body.
pub fn candidate_text(body: &str) -> Result<String, ChatError> {
    if body.trim().is_empty() {
        return Err(ChatError::MalformedUpstream("empty response body".to_string()));
    }

    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::MalformedUpstream(format!("unparseable body: {}", e)))?;

    if let Some(error) = response.error {
        return Err(ChatError::Upstream(error.message));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| ChatError::MalformedUpstream("no candidates returned".to_string()))?;

    candidate
        .content
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| ChatError::MalformedUpstream("candidate content is empty".to_string()))
}

// =============================================================================
// GeminiClient
// =============================================================================

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client from upstream settings. Returns `None` when no
    /// credential is configured.
    pub fn from_config(config: &UpstreamConfig) -> Option<Self> {
        if !config.has_credential() {
            return None;
        }
        let api_key = config.api_key.clone()?;
        Some(Self::new(
            api_key,
            &config.base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn new(api_key: String, base_url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = %status, body = %body, "Raw upstream response");

        if !status.is_success() {
            return Err(ChatError::Upstream(format!("status {}: {}", status, body)));
        }

        candidate_text(&body)
    }
}
