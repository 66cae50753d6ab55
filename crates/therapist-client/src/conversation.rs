//! Ties relay, playback, capture and display together for one user.

use std::sync::Arc;

use crate::capture::SpeechCapture;
use crate::display::DisplayToggles;
use crate::error::ClientError;
use crate::playback::{PlaybackEvent, PlaybackQueue, Speaker};
use crate::relay::RelayClient;

pub struct Conversation {
    relay: RelayClient,
    playback: PlaybackQueue,
    capture: Arc<SpeechCapture>,
    pub display: DisplayToggles,
}

impl Conversation {
    pub fn new(relay: RelayClient, speaker: Arc<dyn Speaker>, capture: SpeechCapture) -> Self {
        Self {
            relay,
            playback: PlaybackQueue::new(speaker),
            capture: Arc::new(capture),
            display: DisplayToggles::new(),
        }
    }

    /// Shared handle so another task can call `stop` during a capture.
    pub fn capture_handle(&self) -> Arc<SpeechCapture> {
        Arc::clone(&self.capture)
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Request the opening greeting and play it.
    pub async fn greet(&mut self) -> Result<Vec<PlaybackEvent>, ClientError> {
        let messages = self.relay.greet().await?;
        self.playback.enqueue(messages);
        self.playback.play_all().await
    }

    /// Send typed text and play the reply. Blank text sends nothing.
    pub async fn submit(&mut self, text: &str) -> Result<Vec<PlaybackEvent>, ClientError> {
        let messages = self.relay.send_user_message(text).await?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        self.playback.enqueue(messages);
        self.playback.play_all().await
    }

    /// Capture one spoken utterance and submit it. Nothing is sent when
    /// voice input is disabled, nothing was heard, or capture was stopped.
    pub async fn capture_and_submit(&mut self) -> Result<Vec<PlaybackEvent>, ClientError> {
        match self.capture.capture().await? {
            Some(text) => self.submit(&text).await,
            None => Ok(Vec::new()),
        }
    }
}
