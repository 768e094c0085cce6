use serde::{Deserialize, Serialize};

use super::WireMessage;

#[derive(Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

/// Error bodies arrive as `{"type":"error","error":{...}}` and must be
/// recognized before attempting the success-shape decode.
#[derive(Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub error: ApiError,
}

#[derive(Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// One decoded SSE event. Only `content_block_delta` events carry text.
#[derive(Deserialize)]
pub struct StreamEventBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub text: Option<String>,
}
