//! Conversation engine for the virtual therapist relay.
//!
//! Builds prompts from per-session transcripts, calls the upstream
//! generative model, and turns its loosely formatted output into validated
//! reply messages.

pub mod canned;
pub mod context;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod types;
pub mod upstream;

pub use context::{SessionStore, Transcript};
pub use error::ChatError;
pub use extract::{extract_payload, parse_reply_messages, MAX_REPLY_MESSAGES};
pub use orchestrator::ChatOrchestrator;
pub use prompt::PromptBuilder;
pub use types::{ChatOutcome, ConversationSession, SessionSummary, TranscriptView};
pub use upstream::{GeminiClient, GenerativeModel};
