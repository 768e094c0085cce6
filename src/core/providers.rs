use serde::{Deserialize, Serialize};

/// The three chat-completion backends this client can talk to. Each one has
/// its own request shape, auth headers, and response schema; everything that
/// needs to branch on the backend goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    Anthropic,
    OpenRouter,
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenRouter => "openrouter",
            Provider::Gemini => "gemini",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::OpenRouter => "OpenRouter (Multiple AI Models)",
            Provider::Gemini => "Google Gemini",
        }
    }

    /// The chat endpoint for this provider. Gemini embeds the model name in
    /// the URL path, so the URL must be rebuilt whenever the model changes.
    pub fn chat_url(self, model: &str) -> String {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
            Provider::OpenRouter => "https://openrouter.ai/api/v1/chat/completions".to_string(),
            Provider::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
            ),
        }
    }

    /// Whether the provider offers a native SSE stream. Gemini does not; its
    /// responses are decoded whole and replayed character by character.
    pub fn supports_streaming(self) -> bool {
        !matches!(self, Provider::Gemini)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Provider {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "anthropic" => Ok(Provider::Anthropic),
            "openrouter" => Ok(Provider::OpenRouter),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(format!("unknown provider: {value}")),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Provider> for String {
    fn from(value: Provider) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_strings_round_trip() {
        for provider in [Provider::Anthropic, Provider::OpenRouter, Provider::Gemini] {
            assert_eq!(Provider::try_from(provider.as_str()), Ok(provider));
        }
    }

    #[test]
    fn unknown_provider_strings_are_rejected() {
        assert!(Provider::try_from("openai").is_err());
        assert!(Provider::try_from("").is_err());
    }

    #[test]
    fn gemini_chat_url_embeds_model() {
        let url = Provider::Gemini.chat_url("gemini-2.5-flash");
        assert!(url.ends_with("/models/gemini-2.5-flash:generateContent"));
    }

    #[test]
    fn only_gemini_lacks_native_streaming() {
        assert!(Provider::Anthropic.supports_streaming());
        assert!(Provider::OpenRouter.supports_streaming());
        assert!(!Provider::Gemini.supports_streaming());
    }
}
