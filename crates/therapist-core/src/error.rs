use thiserror::Error;

/// Top-level error type for the therapist relay.
///
/// Subsystem crates define their own error types and implement
/// `From<TherapistError>` (or the reverse) so `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TherapistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TherapistError {
    fn from(err: toml::de::Error) -> Self {
        TherapistError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TherapistError {
    fn from(err: toml::ser::Error) -> Self {
        TherapistError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TherapistError {
    fn from(err: serde_json::Error) -> Self {
        TherapistError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for relay operations.
pub type Result<T> = std::result::Result<T, TherapistError>;
