//! Conversation context management.
//!
//! Keeps one bounded transcript per session and hands out per-session
//! locks so an entire exchange (user turn, upstream call, therapist turns)
//! runs without interleaving with other requests on the same session.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use therapist_core::Turn;

use crate::error::ChatError;
use crate::types::{ConversationSession, SessionSummary, TranscriptView};

/// Shared handle to a single session.
pub type SessionHandle = Arc<AsyncMutex<ConversationSession>>;

// =============================================================================
// Transcript
// =============================================================================

/// Ordered, speaker-tagged conversation log with a sliding-window cap.
///
/// A `max_turns` of zero disables the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl Transcript {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest turns beyond the cap.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if self.max_turns > 0 {
            while self.turns.len() > self.max_turns {
                self.turns.pop_front();
            }
        }
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        for turn in turns {
            self.push(turn);
        }
    }

    /// Render as newline-joined `Role: text` lines.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Concurrency-safe store of conversation sessions keyed by id.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    /// Transcript cap applied to new sessions.
    pub max_turns: usize,
    /// Idle timeout in minutes.
    pub session_timeout_minutes: u32,
}

impl SessionStore {
    pub fn new(max_turns: usize, session_timeout_minutes: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
            session_timeout_minutes,
        }
    }

    /// Create a fresh, empty session.
    pub fn create_session(&self) -> ConversationSession {
        let now = Utc::now();
        ConversationSession {
            id: Uuid::new_v4(),
            started_at: now,
            last_message_at: now,
            exchange_count: 0,
            transcript: Transcript::new(self.max_turns),
        }
    }

    /// Whether a session has been idle longer than the configured timeout.
    pub fn is_expired(&self, session: &ConversationSession) -> bool {
        let idle = Utc::now() - session.last_message_at;
        idle.num_seconds() > i64::from(self.session_timeout_minutes) * 60
    }

    /// Return the requested session, or a new one when it is unknown or
    /// expired.
    ///
    /// A session currently locked by another request is in use and is
    /// never treated as expired.
    pub fn resolve(&self, requested: Option<Uuid>) -> Result<(Uuid, SessionHandle), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;

        if let Some(sid) = requested {
            if let Some(handle) = sessions.get(&sid) {
                let expired = match handle.try_lock() {
                    Ok(session) => self.is_expired(&session),
                    Err(_) => false,
                };
                if !expired {
                    return Ok((sid, Arc::clone(handle)));
                }
                tracing::debug!(session_id = %sid, "Session expired, starting a new one");
                sessions.remove(&sid);
            }
        }

        let session = self.create_session();
        let sid = session.id;
        let handle = Arc::new(AsyncMutex::new(session));
        sessions.insert(sid, Arc::clone(&handle));
        tracing::debug!(session_id = %sid, "Session created");
        Ok((sid, handle))
    }

    /// Snapshot of a session's transcript.
    pub async fn transcript(&self, session_id: Uuid) -> Result<TranscriptView, ChatError> {
        let handle = self.get(session_id)?;
        let session = handle.lock().await;
        Ok(TranscriptView {
            session_id,
            turns: session.transcript.to_vec(),
        })
    }

    /// Summaries of every live session.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = match self.sessions.lock() {
            Ok(s) => s.values().cloned().collect(),
            Err(_) => return vec![],
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            summaries.push(SessionSummary {
                id: session.id,
                started_at: session.started_at,
                last_message_at: session.last_message_at,
                exchange_count: session.exchange_count,
                turn_count: session.transcript.len(),
            });
        }
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    /// Delete a session by id.
    pub fn remove(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        if sessions.remove(&session_id).is_some() {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Drop idle sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Session lock poisoned: {}", e);
                return 0;
            }
        };
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !self.is_expired(&session),
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle to a live session, without checking expiry.
    pub fn get(&self, session_id: Uuid) -> Result<SessionHandle, ChatError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        sessions
            .get(&session_id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(session_id))
    }
}

// =============================================================================
// Tests
// =============================================================================
