//! Sequential playback of reply messages.
//!
//! Messages are spoken one at a time in arrival order. A message whose text
//! equals the text just spoken is skipped, and the queue still advances past it.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;

use therapist_core::ReplyMessage;

use crate::error::ClientError;

/// Text-to-speech output. `speak` resolves once the utterance has finished.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, message: &ReplyMessage) -> Result<(), ClientError>;
}

/// What happened to the message taken off the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Spoken(ReplyMessage),
    Skipped(ReplyMessage),
}

pub struct PlaybackQueue {
    speaker: Arc<dyn Speaker>,
    pending: VecDeque<ReplyMessage>,
    last_spoken: Option<String>,
}

impl PlaybackQueue {
    pub fn new(speaker: Arc<dyn Speaker>) -> Self {
        Self {
            speaker,
            pending: VecDeque::new(),
            last_spoken: None,
        }
    }

    /// Append messages behind anything already waiting.
    pub fn enqueue(&mut self, messages: impl IntoIterator<Item = ReplyMessage>) {
        self.pending.extend(messages);
    }

    /// Take the head of the queue and speak it, waiting for playback to
    /// finish. Returns `None` when nothing is pending.
    ///
    /// A failed utterance is dropped from the queue so later messages are
    /// not blocked behind it.
    pub async fn play_next(&mut self) -> Result<Option<PlaybackEvent>, ClientError> {
        let Some(message) = self.pending.pop_front() else {
            return Ok(None);
        };

        if self.last_spoken.as_deref() == Some(message.text.as_str()) {
            tracing::debug!(text = %message.text, "Skipping repeated message");
            return Ok(Some(PlaybackEvent::Skipped(message)));
        }

        self.speaker.speak(&message).await?;
        self.last_spoken = Some(message.text.clone());
        Ok(Some(PlaybackEvent::Spoken(message)))
    }

    /// Drain the queue, speaking each message in turn.
    pub async fn play_all(&mut self) -> Result<Vec<PlaybackEvent>, ClientError> {
        let mut events = Vec::with_capacity(self.pending.len());
        while let Some(event) = self.play_next().await? {
            events.push(event);
        }
        Ok(events)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
