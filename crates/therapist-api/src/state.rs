//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use therapist_chat::{ChatOrchestrator, GeminiClient, GenerativeModel};
use therapist_core::TherapistConfig;

/// Shared application state, passed to handlers via axum's `State`
/// extractor. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<TherapistConfig>,
    /// Conversation engine.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an explicit model (or none).
    pub fn new(config: TherapistConfig, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        let orchestrator = ChatOrchestrator::new(&config.conversation, model);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }

    /// Create state with a Gemini client when a credential is configured.
    pub fn from_config(config: TherapistConfig) -> Self {
        let model = GeminiClient::from_config(&config.upstream)
            .map(|client| Arc::new(client) as Arc<dyn GenerativeModel>);
        if model.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; /chat will answer with a fallback reply");
        }
        Self::new(config, model)
    }
}
