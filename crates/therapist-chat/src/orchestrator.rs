//! Chat orchestrator: central coordinator wiring sessions, prompt assembly,
//! the upstream model and reply extraction.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use therapist_core::config::ConversationConfig;
use therapist_core::{ReplyMessage, Turn};

use crate::canned;
use crate::context::{SessionStore, Transcript};
use crate::error::ChatError;
use crate::extract::parse_reply_messages;
use crate::prompt::PromptBuilder;
use crate::types::{ChatOutcome, SessionSummary, TranscriptView};
use crate::upstream::GenerativeModel;

/// Central chat orchestrator.
pub struct ChatOrchestrator {
    store: SessionStore,
    prompt_builder: PromptBuilder,
    model: Option<Arc<dyn GenerativeModel>>,
    max_message_length: usize,
}

impl ChatOrchestrator {
    /// Create a new orchestrator. `model` is `None` when no upstream
    /// credential is configured.
    pub fn new(config: &ConversationConfig, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self {
            store: SessionStore::new(config.max_turns, config.session_timeout_minutes),
            prompt_builder: PromptBuilder::default(),
            model,
            max_message_length: config.max_message_length,
        }
    }

    /// Whether an upstream model is configured.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Handle an incoming chat message.
    ///
    /// Empty input and a missing upstream credential produce canned replies
    /// without touching any transcript. Otherwise the user turn and the
    /// therapist turns are committed together, and only when the upstream
    /// reply parses and validates.
    pub async fn handle_chat(
        &self,
        message: Option<&str>,
        session_id: Option<Uuid>,
    ) -> Result<ChatOutcome, ChatError> {
        let message = match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => {
                return Ok(ChatOutcome {
                    messages: canned::greeting(),
                    session_id: None,
                })
            }
        };

        if message.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let model = match &self.model {
            Some(model) => Arc::clone(model),
            None => {
                tracing::warn!("No upstream credential configured, sending fallback reply");
                return Ok(ChatOutcome {
                    messages: canned::missing_credential(),
                    session_id: None,
                });
            }
        };

        let (sid, handle) = self.store.resolve(session_id)?;
        let is_new = session_id != Some(sid);
        let mut session = handle.lock().await;

        let result = self
            .exchange(model.as_ref(), sid, &session.transcript, message)
            .await;
        let (transcript, messages) = match result {
            Ok(done) => done,
            Err(e) => {
                drop(session);
                // Nobody holds the id of a session created for a failed
                // exchange.
                if is_new && self.store.remove(sid).is_ok() {
                    tracing::debug!(session_id = %sid, "Discarded session of failed exchange");
                }
                return Err(e);
            }
        };

        session.transcript = transcript;
        session.last_message_at = Utc::now();
        session.exchange_count += 1;

        tracing::info!(
            session_id = %sid,
            replies = messages.len(),
            "Chat exchange completed"
        );

        Ok(ChatOutcome {
            messages,
            session_id: Some(sid),
        })
    }

    /// Run one prompt/reply round on a copy of `transcript`. The returned
    /// transcript holds the user turn and the therapist turns.
    async fn exchange(
        &self,
        model: &dyn GenerativeModel,
        sid: Uuid,
        transcript: &Transcript,
        message: &str,
    ) -> Result<(Transcript, Vec<ReplyMessage>), ChatError> {
        let mut working = transcript.clone();
        working.push(Turn::user(message));
        let prompt = self.prompt_builder.build(&working);

        tracing::debug!(
            session_id = %sid,
            model = model.name(),
            turns = working.len(),
            "Sending prompt upstream"
        );

        let raw = model.generate(&prompt).await.map_err(|e| {
            tracing::error!(session_id = %sid, error = %e, "Upstream call failed");
            e
        })?;

        let messages = parse_reply_messages(&raw).map_err(|e| {
            tracing::error!(session_id = %sid, error = %e, raw = %raw, "Could not parse model reply");
            e
        })?;

        working.extend(messages.iter().map(|m| Turn::therapist(m.text.clone())));
        Ok((working, messages))
    }

    /// Transcript of a session.
    pub async fn transcript(&self, session_id: Uuid) -> Result<TranscriptView, ChatError> {
        self.store.transcript(session_id).await
    }

    /// List all live sessions.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.store.list().await
    }

    /// Delete a session by id.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        self.store.remove(session_id)
    }

    /// Drop idle sessions.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
