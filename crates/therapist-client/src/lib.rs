//! Conversation client for the therapist relay.
//!
//! Sends typed or recognized speech to the relay, queues the reply
//! messages, and plays them one at a time through a speech synthesizer.

pub mod capture;
pub mod conversation;
pub mod display;
pub mod error;
pub mod playback;
pub mod relay;

pub use capture::{CaptureState, Recognizer, SpeechCapture};
pub use conversation::Conversation;
pub use display::DisplayToggles;
pub use error::ClientError;
pub use playback::{PlaybackEvent, PlaybackQueue, Speaker};
pub use relay::RelayClient;
