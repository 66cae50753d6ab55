//! Session bookkeeping types for the conversation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use therapist_core::{ReplyMessage, Turn};

use crate::context::Transcript;

/// A single conversation scoped by session identifier.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    /// Number of completed user/therapist exchanges.
    pub exchange_count: u64,
    pub transcript: Transcript,
}

/// Lightweight listing entry for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub exchange_count: u64,
    pub turn_count: usize,
}

/// Read-only copy of a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptView {
    pub session_id: Uuid,
    pub turns: Vec<Turn>,
}

/// Result of handling one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub messages: Vec<ReplyMessage>,
    /// Session the exchange was recorded under; `None` for canned replies
    /// that never touched a transcript.
    pub session_id: Option<Uuid>,
}
