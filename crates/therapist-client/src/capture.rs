//! Single-utterance speech capture.
//!
//! Capture state moves between two states:
//! - Idle -> Recording (capture started)
//! - Recording -> Idle (utterance recognized, recognizer failed, stopped, or
//!   the capture future dropped)
//!
//! Without a recognizer, voice input is disabled and `capture` returns
//! `None` immediately.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::ClientError;

/// Recording status of the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Idle,
    Recording,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Recording => write!(f, "Recording"),
        }
    }
}

impl CaptureState {
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Recording)
                | (CaptureState::Recording, CaptureState::Idle)
        )
    }
}

/// Speech-to-text engine. Resolves with the transcription of one utterance,
/// or `None` if nothing was heard.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self) -> Result<Option<String>, ClientError>;
}

pub struct SpeechCapture {
    recognizer: Option<Arc<dyn Recognizer>>,
    state: Mutex<CaptureState>,
    /// Bumped under the state lock each time a capture starts.
    generation: AtomicU64,
    cancel: Notify,
}

/// Returns the capture to `Idle` when the capture that started it ends,
/// including when its future is dropped before completion.
struct RecordingGuard<'a> {
    capture: &'a SpeechCapture,
    generation: u64,
}

impl Drop for RecordingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.capture.state.lock() {
            let current = self.capture.generation.load(Ordering::SeqCst);
            if *state == CaptureState::Recording && current == self.generation {
                *state = CaptureState::Idle;
            }
        }
    }
}

impl SpeechCapture {
    pub fn new(recognizer: Option<Arc<dyn Recognizer>>) -> Self {
        if recognizer.is_none() {
            tracing::info!("No speech recognizer available, voice input disabled");
        }
        Self {
            recognizer,
            state: Mutex::new(CaptureState::Idle),
            generation: AtomicU64::new(0),
            cancel: Notify::new(),
        }
    }

    /// Capture with voice input disabled.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> CaptureState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(CaptureState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        self.state() == CaptureState::Recording
    }

    /// Record and transcribe a single utterance.
    ///
    /// Returns `Ok(None)` when voice input is disabled, nothing was heard,
    /// or the capture was stopped before a result arrived.
    pub async fn capture(&self) -> Result<Option<String>, ClientError> {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return Ok(None);
        };

        let notified = self.cancel.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let _guard = self.start_recording()?;
        tracing::debug!("Speech capture started");

        tokio::select! {
            biased;
            _ = &mut notified => {
                tracing::debug!("Speech capture stopped");
                Ok(None)
            }
            result = recognizer.recognize() => {
                let text = result?
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                tracing::debug!(recognized = text.is_some(), "Speech capture finished");
                Ok(text)
            }
        }
    }

    /// Cancel a pending capture. Does nothing while idle.
    pub fn stop(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if *state == CaptureState::Recording {
            *state = CaptureState::Idle;
            self.cancel.notify_waiters();
        }
    }

    fn start_recording(&self) -> Result<RecordingGuard<'_>, ClientError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| ClientError::Capture(format!("state lock poisoned: {}", e)))?;
        if !state.can_transition_to(&CaptureState::Recording) {
            return Err(ClientError::Capture(format!(
                "cannot move from {} to {}",
                *state,
                CaptureState::Recording
            )));
        }
        *state = CaptureState::Recording;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RecordingGuard {
            capture: self,
            generation,
        })
    }
}
