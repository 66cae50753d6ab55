//! Error types for the conversation client.

/// Errors from the conversation client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("relay returned {status}: {message}")]
    Relay { status: u16, message: String },
    #[error("speech synthesis error: {0}")]
    Speech(String),
    #[error("speech capture error: {0}")]
    Capture(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
