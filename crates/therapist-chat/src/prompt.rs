//! Prompt assembly for the upstream model.

use crate::context::Transcript;

/// Fixed instruction preceding the conversation history.
pub const SYSTEM_INSTRUCTION: &str = "You are a virtual professional therapist.
You will always reply with a JSON array of messages (max 3 messages).
Each message has a \"text\", \"facialExpression\", and \"animation\" property.
Available facial expressions: \"smile\" and \"default\".
Available animations: \"Idle\" and \"Talking\".";

/// Cue that asks the model to continue as the therapist.
pub const TRAILING_CUE: &str = "Therapist:";

/// Builds the single-turn prompt sent upstream.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instruction: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(SYSTEM_INSTRUCTION)
    }
}

impl PromptBuilder {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Instruction, then the rendered history, then the trailing cue.
    pub fn build(&self, transcript: &Transcript) -> String {
        format!(
            "{}\nConversation history:\n{}\n{}",
            self.instruction,
            transcript.render(),
            TRAILING_CUE
        )
    }
}
