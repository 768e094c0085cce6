//! Request and response payloads for the three provider APIs.
//!
//! These are plain serde types; decoding policy (error-envelope probing,
//! fragment extraction) lives in [`crate::core::chat_stream`].

pub mod anthropic;
pub mod gemini;
pub mod models;
pub mod openrouter;

use serde::Serialize;

use crate::core::message::Message;

/// The `{role, content}` message shape shared by the Anthropic and
/// OpenRouter chat endpoints.
#[derive(Serialize, Clone)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

pub fn to_wire_messages(conversation: &[Message]) -> Vec<WireMessage> {
    conversation
        .iter()
        .map(|message| WireMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        })
        .collect()
}
