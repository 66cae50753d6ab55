//! Error types for the conversation engine.

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("upstream response malformed: {0}")]
    MalformedUpstream(String),
    #[error("reply is not valid JSON: {0}")]
    Extraction(String),
    #[error("invalid reply: {0}")]
    InvalidReply(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl ChatError {
    /// Whether this error belongs to the generic "service failure" class
    /// reported to callers without further detail.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            ChatError::Upstream(_)
                | ChatError::MalformedUpstream(_)
                | ChatError::Extraction(_)
                | ChatError::InvalidReply(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    /// The request URL is dropped from the message so credentials never
    /// reach the logs.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ChatError::Upstream(format!("timed out: {}", err))
        } else {
            ChatError::Upstream(err.to_string())
        }
    }
}
