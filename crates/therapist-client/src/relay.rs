//! HTTP client for the relay's `POST /chat` endpoint.

use std::time::Duration;

use reqwest::Client as HttpClient;
use uuid::Uuid;

use therapist_core::{ChatRequest, ChatResponseBody, ReplyMessage};

use crate::error::ClientError;

const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Talks to the relay and remembers the session it was assigned.
pub struct RelayClient {
    http: HttpClient,
    chat_url: String,
    timeout: Duration,
    session_id: Option<Uuid>,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            chat_url: format!("{}/chat", base_url.trim_end_matches('/')),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_id: None,
        }
    }

    /// Session assigned by the relay, once a message has been answered.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Send user text. Blank text is not sent and yields no messages.
    pub async fn send_user_message(&mut self, text: &str) -> Result<Vec<ReplyMessage>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.post_chat(Some(text)).await
    }

    /// Ask for the opening greeting.
    pub async fn greet(&mut self) -> Result<Vec<ReplyMessage>, ClientError> {
        self.post_chat(None).await
    }

    async fn post_chat(&mut self, message: Option<&str>) -> Result<Vec<ReplyMessage>, ClientError> {
        let request = ChatRequest {
            message: message.map(str::to_string),
            session_id: self.session_id,
        };

        let response = self
            .http
            .post(&self.chat_url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(body);
            tracing::warn!(status = %status, error = %message, "Relay request failed");
            return Err(ClientError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponseBody = response.json().await?;
        if let Some(sid) = body.session_id {
            self.session_id = Some(sid);
        }
        tracing::debug!(count = body.messages.len(), "Relay replied");
        Ok(body.messages)
    }
}
