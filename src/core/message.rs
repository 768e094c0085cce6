use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::core::error::{ChatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, String> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// One reasoning trace entry attached by OpenRouter to assistant replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningDetail {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// One conversation turn. Reasoning fields are only populated for
/// OpenRouter non-streaming replies; they persist with the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<Vec<ReasoningDetail>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning: None,
            reasoning_details: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Write the transcript to a timestamp-derived filename in the working
/// directory and return the path.
pub fn save_history(conversation: &[Message]) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let path = PathBuf::from(format!("conversation_history_{timestamp}.json"));
    save_history_to(conversation, &path)?;
    Ok(path)
}

pub fn save_history_to(conversation: &[Message], path: &Path) -> Result<()> {
    let contents = serde_json::to_string_pretty(conversation)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Read a transcript back from a user-supplied path. A missing or
/// unparseable file is a `Config` error; the caller keeps its current
/// history.
pub fn load_history(path: &Path) -> Result<Vec<Message>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ChatError::Config(format!("cannot read {}: {e}", path.display())))?;
    let conversation = serde_json::from_str(&contents)
        .map_err(|e| ChatError::Config(format!("cannot parse {}: {e}", path.display())))?;
    Ok(conversation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roles_round_trip_through_strings() {
        assert_eq!(Role::try_from("user"), Ok(Role::User));
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
        assert!(Role::try_from("system").is_err());
    }

    #[test]
    fn history_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut reply = Message::assistant("Hello!");
        reply.reasoning = Some("thinking".to_string());
        let conversation = vec![Message::user("Hi"), reply, Message::user("And you?")];

        save_history_to(&conversation, &path).unwrap();
        let loaded = load_history(&path).unwrap();

        assert_eq!(loaded.len(), conversation.len());
        for (saved, loaded) in conversation.iter().zip(&loaded) {
            assert_eq!(saved.role, loaded.role);
            assert_eq!(saved.content, loaded.content);
            assert_eq!(saved.reasoning, loaded.reasoning);
        }
    }

    #[test]
    fn loading_a_missing_file_reports_a_config_error() {
        let dir = tempdir().unwrap();
        let err = load_history(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn plain_wire_format_is_accepted() {
        // Transcripts written by other clients carry only role and content.
        let loaded: Vec<Message> =
            serde_json::from_str(r#"[{"role":"user","content":"hi"}]"#).unwrap();
        assert_eq!(loaded[0].role, Role::User);
        assert!(loaded[0].reasoning.is_none());
    }
}
