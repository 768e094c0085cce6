//! Provider response normalization.
//!
//! Three wire formats come in — a single Anthropic JSON document, an
//! OpenAI-shaped OpenRouter document, and a Gemini document — plus two SSE
//! dialects for the streaming endpoints. Everything is folded into one
//! contract: a sequence of text fragments and a terminal status.

use futures_util::StreamExt;
use memchr::memchr;
use serde_json::Value;
use tracing::debug;

use crate::api::{anthropic, gemini, openrouter};
use crate::core::error::{ChatError, Result};
use crate::core::message::{Message, ReasoningDetail, Role};
use crate::core::providers::Provider;

/// One decoded unit of a streaming response. Never persisted; folded into
/// the accumulating reply as soon as it is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// A fully normalized non-streaming reply.
#[derive(Debug)]
pub struct AssistantReply {
    pub text: String,
    pub reasoning: Option<String>,
    pub reasoning_details: Option<Vec<ReasoningDetail>>,
    pub usage: Option<String>,
}

impl AssistantReply {
    fn plain(text: String) -> Self {
        Self {
            text,
            reasoning: None,
            reasoning_details: None,
            usage: None,
        }
    }

    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.text,
            reasoning: self.reasoning,
            reasoning_details: self.reasoning_details,
        }
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Decode one SSE line into at most one event.
///
/// Blank lines and non-text events yield nothing. A payload that fails to
/// decode is skipped unless it carries an error or quota marker, in which
/// case the stream must abort; a single malformed delta never kills the
/// stream on its own.
pub fn decode_sse_line(provider: Provider, line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(event_type) = line.strip_prefix("event:") {
        if event_type.trim() == "error" {
            return Some(StreamEvent::Error(
                "stream reported an error event".to_string(),
            ));
        }
        return None;
    }

    let payload = extract_data_payload(line)?;
    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    if payload.is_empty() {
        return None;
    }

    let delta = match provider {
        Provider::Anthropic => match serde_json::from_str::<anthropic::StreamEventBody>(payload) {
            Ok(event) => match event.kind.as_str() {
                "content_block_delta" => Ok(event.delta.and_then(|d| d.text)),
                // An error body inside a data line still has `type`.
                "error" => return Some(StreamEvent::Error(format_api_error(payload))),
                _ => Ok(None),
            },
            Err(e) => Err(e),
        },
        Provider::OpenRouter => match serde_json::from_str::<openrouter::StreamChunk>(payload) {
            Ok(chunk) => match chunk.choices.into_iter().next() {
                Some(choice) => Ok(choice.delta.content),
                // A well-formed body with no choices is how OpenRouter
                // delivers in-stream errors like quota exhaustion.
                None => match serde_json::from_str::<Value>(payload) {
                    Ok(value) if value.get("error").is_some() => {
                        return Some(StreamEvent::Error(format_api_error(payload)));
                    }
                    _ => Ok(None),
                },
            },
            Err(e) => Err(e),
        },
        // Gemini has no SSE mode; its replies are simulated from a full
        // document and never reach this decoder.
        Provider::Gemini => return None,
    };

    match delta {
        Ok(Some(text)) if !text.is_empty() => Some(StreamEvent::Delta(text)),
        Ok(_) => None,
        Err(e) => {
            if payload.contains("error") || payload.contains("insufficient_quota") {
                Some(StreamEvent::Error(format_api_error(payload)))
            } else {
                debug!("skipping undecodable SSE event: {e}");
                None
            }
        }
    }
}

/// Pull a human-readable summary out of an arbitrary error body, checking
/// the common `error.message` / `error` / `message` placements.
pub fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| value.get("message").and_then(|v| v.as_str().map(str::to_owned)));

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

pub fn format_api_error(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "API error: <empty body>".to_string();
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&value) {
            if !summary.is_empty() {
                return format!("API error: {summary}");
            }
        }
    }
    format!("API error: {trimmed}")
}

/// Decode a complete (non-streaming) response body into a normalized reply.
///
/// Error envelopes are probed with typed decodes before the success shape is
/// attempted; a body that matches neither is a decode error, not a panic.
pub fn extract_assistant_text(provider: Provider, body: &str) -> Result<AssistantReply> {
    match provider {
        Provider::Anthropic => extract_anthropic(body),
        Provider::OpenRouter => extract_openrouter(body),
        Provider::Gemini => extract_gemini(body),
    }
}

fn extract_anthropic(body: &str) -> Result<AssistantReply> {
    // The error envelope also has a `type` field, so probe it first.
    if let Ok(envelope) = serde_json::from_str::<anthropic::ErrorEnvelope>(body) {
        if envelope.kind == "error" {
            return Err(ChatError::Provider(format!(
                "{}: {}",
                envelope.error.kind, envelope.error.message
            )));
        }
    }

    let response: anthropic::MessagesResponse = serde_json::from_str(body)?;
    let text: String = response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect();
    Ok(AssistantReply::plain(text))
}

fn extract_openrouter(body: &str) -> Result<AssistantReply> {
    let response: openrouter::ChatResponse = serde_json::from_str(body)?;
    let Some(choice) = response.choices.into_iter().next() else {
        let summary = serde_json::from_str::<Value>(body)
            .ok()
            .as_ref()
            .and_then(extract_error_summary);
        return Err(ChatError::Provider(match summary {
            Some(summary) => summary,
            None => "no response choices received".to_string(),
        }));
    };

    Ok(AssistantReply {
        text: choice.message.content,
        reasoning: choice.message.reasoning,
        reasoning_details: choice.message.reasoning_details,
        usage: None,
    })
}

fn extract_gemini(body: &str) -> Result<AssistantReply> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.get("error").is_some() {
            let summary = extract_error_summary(&value)
                .unwrap_or_else(|| "unspecified Gemini error".to_string());
            return Err(ChatError::Provider(summary));
        }
    }

    let response: gemini::GenerateResponse = serde_json::from_str(body)?;
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ChatError::Provider(
            "no response candidates from Gemini".to_string(),
        ));
    };

    let text: String = candidate
        .content
        .parts
        .iter()
        .map(|part| part.text.as_str())
        .collect();

    if text.trim().is_empty() {
        return Err(ChatError::Provider(match candidate.finish_reason {
            Some(reason) if reason.contains("SAFETY") => {
                "response blocked by Gemini safety filters".to_string()
            }
            Some(reason) => format!("empty response from Gemini (finish reason: {reason})"),
            None => "empty response from Gemini".to_string(),
        }));
    }

    let usage = response.usage_metadata.map(|u| {
        format!(
            "Token usage: {} prompt + {} response = {} total",
            u.prompt_token_count, u.candidates_token_count, u.total_token_count
        )
    });

    Ok(AssistantReply {
        text,
        reasoning: None,
        reasoning_details: None,
        usage,
    })
}

/// Consume an SSE response line by line, invoking `on_delta` for every text
/// fragment in arrival order, and return the concatenated reply.
///
/// Reads are strictly sequential; the loop suspends on the connection and
/// nothing else runs during a turn.
pub async fn run_sse_stream<F>(
    provider: Provider,
    response: reqwest::Response,
    mut on_delta: F,
) -> Result<String>
where
    F: FnMut(&str),
{
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut reply = String::new();
    let mut line_count = 0u64;

    'read: while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(s) => s.trim().to_string(),
                Err(e) => {
                    debug!("invalid UTF-8 in stream: {e}");
                    buffer.drain(..=newline_pos);
                    continue;
                }
            };
            buffer.drain(..=newline_pos);
            line_count += 1;

            match decode_sse_line(provider, &line) {
                Some(StreamEvent::Delta(text)) => {
                    on_delta(&text);
                    reply.push_str(&text);
                }
                Some(StreamEvent::Done) => break 'read,
                Some(StreamEvent::Error(message)) => {
                    return Err(ChatError::Provider(message));
                }
                None => {}
            }
        }
    }

    debug!("stream ended after {line_count} lines, {} bytes of text", reply.len());
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_stream(provider: Provider, lines: &[&str]) -> (String, Option<StreamEvent>) {
        let mut reply = String::new();
        for line in lines {
            match decode_sse_line(provider, line) {
                Some(StreamEvent::Delta(text)) => reply.push_str(&text),
                Some(terminal) => return (reply, Some(terminal)),
                None => {}
            }
        }
        (reply, None)
    }

    #[test]
    fn anthropic_deltas_assemble_in_order() {
        let (reply, terminal) = collect_stream(
            Provider::Anthropic,
            &[
                r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"Hel"}}"#,
                "",
                r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"lo"}}"#,
                "data: [DONE]",
            ],
        );
        assert_eq!(reply, "Hello");
        assert_eq!(terminal, Some(StreamEvent::Done));
    }

    #[test]
    fn openrouter_deltas_assemble_in_order() {
        let (reply, terminal) = collect_stream(
            Provider::OpenRouter,
            &[
                r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
                r#"data:{"choices":[{"delta":{"content":"lo"}}]}"#,
                "data: [DONE]",
            ],
        );
        assert_eq!(reply, "Hello");
        assert_eq!(terminal, Some(StreamEvent::Done));
    }

    #[test]
    fn malformed_event_between_good_ones_is_skipped() {
        let (reply, terminal) = collect_stream(
            Provider::OpenRouter,
            &[
                r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
                "data: {not json at all",
                r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
                "data: [DONE]",
            ],
        );
        assert_eq!(reply, "Hello");
        assert_eq!(terminal, Some(StreamEvent::Done));
    }

    #[test]
    fn undecodable_event_with_error_marker_aborts() {
        let event = decode_sse_line(
            Provider::OpenRouter,
            r#"data: {"error":{"message":"insufficient_quota","code":429},"#,
        );
        assert!(matches!(event, Some(StreamEvent::Error(_))));
    }

    #[test]
    fn well_formed_error_body_without_choices_aborts() {
        let event = decode_sse_line(
            Provider::OpenRouter,
            r#"data: {"error":{"message":"quota exceeded","code":429}}"#,
        );
        match event {
            Some(StreamEvent::Error(message)) => assert!(message.contains("quota exceeded")),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn anthropic_error_body_in_data_line_aborts() {
        let event = decode_sse_line(
            Provider::Anthropic,
            r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        match event {
            Some(StreamEvent::Error(message)) => assert!(message.contains("Overloaded")),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn error_event_line_is_promoted_immediately() {
        let event = decode_sse_line(Provider::Anthropic, "event: error");
        assert!(matches!(event, Some(StreamEvent::Error(_))));
        assert_eq!(decode_sse_line(Provider::Anthropic, "event: ping"), None);
    }

    #[test]
    fn non_delta_anthropic_events_yield_nothing() {
        for line in [
            r#"data: {"type":"message_start","message":{}}"#,
            r#"data: {"type":"message_stop"}"#,
            r#"data: {"type":"content_block_stop","index":0}"#,
        ] {
            assert_eq!(decode_sse_line(Provider::Anthropic, line), None);
        }
    }

    #[test]
    fn anthropic_document_concatenates_text_blocks() {
        let body = r#"{
            "id":"msg_1","type":"message","role":"assistant","model":"claude",
            "content":[{"type":"text","text":"Hel"},{"type":"text","text":"lo"}]
        }"#;
        let reply = extract_assistant_text(Provider::Anthropic, body).unwrap();
        assert_eq!(reply.text, "Hello");
    }

    #[test]
    fn streamed_and_whole_document_replies_agree() {
        let (streamed, _) = collect_stream(
            Provider::Anthropic,
            &[
                r#"data: {"type":"content_block_delta","delta":{"text":"Hel"}}"#,
                r#"data: {"type":"content_block_delta","delta":{"text":"lo"}}"#,
                "data: [DONE]",
            ],
        );
        let body = r#"{"content":[{"type":"text","text":"Hello"}]}"#;
        let whole = extract_assistant_text(Provider::Anthropic, body).unwrap();
        assert_eq!(streamed, whole.text);
    }

    #[test]
    fn anthropic_error_envelope_is_probed_first() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = extract_assistant_text(Provider::Anthropic, body).unwrap_err();
        match err {
            ChatError::Provider(message) => {
                assert!(message.contains("overloaded_error"));
                assert!(message.contains("Overloaded"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn openrouter_reply_carries_reasoning() {
        let body = r#"{"choices":[{"message":{
            "content":"Hi there",
            "reasoning":"thinking about greetings",
            "reasoning_details":[{"type":"reasoning.text","text":"hm"}]
        }}]}"#;
        let reply = extract_assistant_text(Provider::OpenRouter, body).unwrap();
        assert_eq!(reply.text, "Hi there");
        assert_eq!(reply.reasoning.as_deref(), Some("thinking about greetings"));
        assert_eq!(reply.reasoning_details.unwrap().len(), 1);
    }

    #[test]
    fn openrouter_without_choices_reports_the_error_body() {
        let body = r#"{"error":{"message":"No endpoints found","code":404}}"#;
        let err = extract_assistant_text(Provider::OpenRouter, body).unwrap_err();
        match err {
            ChatError::Provider(message) => assert_eq!(message, "No endpoints found"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn gemini_reports_empty_candidates_and_safety_blocks() {
        let err = extract_assistant_text(Provider::Gemini, r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, ChatError::Provider(_)));

        let body = r#"{"candidates":[{"content":{"parts":[]},"finishReason":"SAFETY"}]}"#;
        let err = extract_assistant_text(Provider::Gemini, body).unwrap_err();
        match err {
            ChatError::Provider(message) => assert!(message.contains("safety")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn gemini_reply_includes_usage_line() {
        let body = r#"{
            "candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}],
            "usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":5,"totalTokenCount":8}
        }"#;
        let reply = extract_assistant_text(Provider::Gemini, body).unwrap();
        assert_eq!(reply.text, "Hello");
        assert_eq!(
            reply.usage.as_deref(),
            Some("Token usage: 3 prompt + 5 response = 8 total")
        );
    }

    #[test]
    fn format_api_error_prefers_nested_message() {
        let raw = r#"{"error":{"message":"model   overloaded","type":"x"}}"#;
        assert_eq!(format_api_error(raw), "API error: model overloaded");
        assert_eq!(format_api_error("plain failure"), "API error: plain failure");
        assert_eq!(format_api_error("  "), "API error: <empty body>");
    }
}
