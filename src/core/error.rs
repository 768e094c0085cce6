use thiserror::Error;

/// Failure classes for one interactive session.
///
/// `Transport`, `Provider`, and `Decode` are recoverable inside the chat
/// loop: the turn is abandoned, a message is printed, and the prompt comes
/// back. `Config` recovers by re-running setup. `Validation` is fatal and
/// ends the process before a session starts.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("config error: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Provider(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
