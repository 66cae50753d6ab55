//! Terminal front end for the conversation client.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use therapist_client::{ClientError, Conversation, RelayClient, Speaker, SpeechCapture};
use therapist_core::{FacialExpression, ReplyMessage};

/// "Speaks" by printing each message with its expression and animation.
pub struct ConsoleSpeaker;

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, message: &ReplyMessage) -> Result<(), ClientError> {
        println!("{}", format_message(message));
        Ok(())
    }
}

pub fn format_message(message: &ReplyMessage) -> String {
    let expression = match message.facial_expression {
        FacialExpression::Smile => "smile",
        FacialExpression::Default => "default",
    };
    format!("[{}/{:?}] {}", expression, message.animation, message.text)
}

/// Read lines from stdin and relay them until EOF or `/quit`.
///
/// `/zoom` and `/green` flip the display toggles.
pub async fn run(url: &str) -> Result<(), ClientError> {
    let relay = RelayClient::new(url);
    let mut conversation = Conversation::new(relay, Arc::new(ConsoleSpeaker), SpeechCapture::disabled());

    tracing::info!(url = %url, "Connecting to relay");
    if let Err(e) = conversation.greet().await {
        tracing::warn!(error = %e, "Greeting failed");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" => break,
            "/zoom" => {
                let on = conversation.display.toggle_camera_zoom();
                println!("camera zoom: {}", if on { "on" } else { "off" });
            }
            "/green" => {
                let on = conversation.display.toggle_green_screen();
                println!("green screen: {}", if on { "on" } else { "off" });
            }
            text => {
                if let Err(e) = conversation.submit(text).await {
                    tracing::error!(error = %e, "Message failed");
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    Ok(())
}
