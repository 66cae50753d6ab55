//! Fixed replies returned without contacting the upstream model.

use therapist_core::{Animation, FacialExpression, ReplyMessage};

pub const GREETING_TEXT: &str = "How are you feeling today?";

/// Reply to an empty or missing message.
pub fn greeting() -> Vec<ReplyMessage> {
    vec![
        ReplyMessage::new(GREETING_TEXT, FacialExpression::Smile, Animation::Talking),
        ReplyMessage::new(GREETING_TEXT, FacialExpression::Smile, Animation::Meeting),
    ]
}

/// Reply when no upstream credential is configured.
pub fn missing_credential() -> Vec<ReplyMessage> {
    vec![ReplyMessage::new(
        GREETING_TEXT,
        FacialExpression::Smile,
        Animation::Meeting,
    )]
}
