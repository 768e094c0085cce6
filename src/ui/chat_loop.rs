//! The interactive chat session loop.
//!
//! One logical thread drives everything: read a line, dispatch it, block on
//! the network, fold the reply into history, repeat. A failed turn reports
//! inline and leaves the history untouched; only `/exit` and `/menu` leave
//! the loop.

use std::io::{self, Write};
use std::time::Duration;

use tracing::debug;

use crate::api::{anthropic, gemini, openrouter, to_wire_messages};
use crate::commands::{parse_chat_input, print_chat_help, ChatCommand};
use crate::core::chat_stream::{extract_assistant_text, format_api_error, run_sse_stream};
use crate::core::config::{Config, DEFAULT_ANTHROPIC_VERSION};
use crate::core::error::Result;
use crate::core::message::{load_history, save_history, Message};
use crate::core::providers::Provider;
use crate::ui::ansi::{BLUE, BOLD, CYAN, GREEN, RESET, YELLOW};

const MAX_TOKENS: u32 = 1024;

/// Inter-character delay when replaying a Gemini reply as a fake stream.
const TYPING_DELAY: Duration = Duration::from_millis(10);

/// Why the session loop returned.
pub enum SessionOutcome {
    BackToMenu,
    ExitApp,
}

/// The result of one submitted message. Errors never escape a turn as
/// control flow; they come back as `Recoverable` and the loop keeps going.
enum TurnResult {
    Success(Message),
    Recoverable(String),
}

pub async fn run_session(config: &Config, client: &reqwest::Client) -> Result<SessionOutcome> {
    let mut conversation: Vec<Message> = Vec::new();

    println!("\n{BOLD}{GREEN}💬 Chat Session Started{RESET}");
    println!("{BLUE}Model: {YELLOW}{}{RESET}", config.model);
    if config.use_streaming {
        println!("{BLUE}Mode: {YELLOW}streaming{RESET}");
    }
    println!("{CYAN}Type /help or ? for chat commands{RESET}\n");

    loop {
        print!("{BOLD}You:{RESET} ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF behaves like an empty message.
            return Ok(SessionOutcome::BackToMenu);
        }

        match parse_chat_input(&line) {
            ChatCommand::BackToMenu => {
                println!("{GREEN}📋 Returning to main menu...{RESET}");
                return Ok(SessionOutcome::BackToMenu);
            }
            ChatCommand::ExitApp => {
                if config.autosave {
                    report_save(&conversation);
                }
                println!("{YELLOW}👋 Goodbye!{RESET}");
                return Ok(SessionOutcome::ExitApp);
            }
            ChatCommand::Help => print_chat_help(),
            ChatCommand::Clear => {
                conversation.clear();
                println!("📜 Conversation history cleared.");
            }
            ChatCommand::ShowConfig => config.print_summary(),
            ChatCommand::Save => report_save(&conversation),
            ChatCommand::Load => {
                print!("Enter the path to the conversation history file: ");
                io::stdout().flush()?;
                let mut path = String::new();
                io::stdin().read_line(&mut path)?;
                match load_history(std::path::Path::new(path.trim())) {
                    Ok(loaded) => {
                        conversation = loaded;
                        println!("📜 Conversation history loaded ({} messages).", conversation.len());
                    }
                    Err(e) => println!("❌ {e}"),
                }
            }
            ChatCommand::Message(text) => {
                let user_message = Message::user(text);
                let turn = run_turn(config, client, &conversation, &user_message).await;
                apply_turn(&mut conversation, user_message, turn);
            }
        }
    }
}

/// Fold a finished turn into the transcript. Only a successful turn commits
/// anything; a recoverable failure reports and leaves the history untouched.
fn apply_turn(conversation: &mut Vec<Message>, user_message: Message, turn: TurnResult) {
    match turn {
        TurnResult::Success(reply) => {
            conversation.push(user_message);
            conversation.push(reply);
        }
        TurnResult::Recoverable(error) => {
            println!("❌ {error}");
            println!("💡 Type /menu to return to the main menu or /help for commands.");
        }
    }
}

/// Submit one message and normalize the reply. The user message is only
/// committed to history by the caller after a successful turn.
async fn run_turn(
    config: &Config,
    client: &reqwest::Client,
    conversation: &[Message],
    user_message: &Message,
) -> TurnResult {
    let mut outgoing: Vec<Message> = conversation.to_vec();
    outgoing.push(user_message.clone());

    // Gemini is always served from a complete document; streaming mode only
    // changes how the text is displayed.
    let want_stream = config.use_streaming && config.provider.supports_streaming();

    let request = build_request(config, client, &outgoing, want_stream);
    debug!(provider = %config.provider, streaming = want_stream, "submitting chat turn");

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return TurnResult::Recoverable(format!("request failed: {e}")),
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return TurnResult::Recoverable(describe_http_failure(config, status, &body));
    }

    if want_stream {
        stream_reply(config.provider, response).await
    } else {
        whole_reply(config, response).await
    }
}

async fn whole_reply(config: &Config, response: reqwest::Response) -> TurnResult {
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return TurnResult::Recoverable(format!("failed to read response: {e}")),
    };

    let reply = match extract_assistant_text(config.provider, &body) {
        Ok(reply) => reply,
        Err(e) => return TurnResult::Recoverable(e.to_string()),
    };

    if let Some(reasoning) = &reply.reasoning {
        println!("🧠 Model reasoning:\n{reasoning}\n---");
    }
    if let Some(details) = &reply.reasoning_details {
        for detail in details {
            if let Some(text) = &detail.text {
                println!("🔍 [{}] {text}", detail.kind);
            }
        }
    }

    if config.use_streaming {
        // Simulated typing for providers without native streaming.
        print!("{BOLD}Assistant:{RESET} ");
        let _ = io::stdout().flush();
        for c in reply.text.chars() {
            print!("{c}");
            let _ = io::stdout().flush();
            tokio::time::sleep(TYPING_DELAY).await;
        }
        println!();
    } else {
        println!("{BOLD}Assistant:{RESET} {}", reply.text);
    }

    if let Some(usage) = &reply.usage {
        println!("{CYAN}{usage}{RESET}");
    }

    TurnResult::Success(reply.into_message())
}

async fn stream_reply(provider: Provider, response: reqwest::Response) -> TurnResult {
    print!("{BOLD}Assistant:{RESET} ");
    let _ = io::stdout().flush();

    let outcome = run_sse_stream(provider, response, |fragment| {
        print!("{fragment}");
        let _ = io::stdout().flush();
    })
    .await;
    println!();

    match outcome {
        Ok(text) if !text.is_empty() => TurnResult::Success(Message::assistant(text)),
        Ok(_) => TurnResult::Recoverable(
            "no response received from the streaming API; the model may not support streaming"
                .to_string(),
        ),
        Err(e) => TurnResult::Recoverable(e.to_string()),
    }
}

fn build_request(
    config: &Config,
    client: &reqwest::Client,
    conversation: &[Message],
    stream: bool,
) -> reqwest::RequestBuilder {
    match config.provider {
        Provider::Anthropic => client
            .post(&config.url)
            .header("x-api-key", &config.api_key)
            .header(
                "anthropic-version",
                config
                    .anthropic_version
                    .as_deref()
                    .unwrap_or(DEFAULT_ANTHROPIC_VERSION),
            )
            .json(&anthropic::MessagesRequest {
                model: config.model.clone(),
                messages: to_wire_messages(conversation),
                max_tokens: MAX_TOKENS,
                stream,
            }),
        Provider::OpenRouter => {
            let mut request = client
                .post(&config.url)
                .header("Authorization", format!("Bearer {}", config.api_key));
            if let Some(site_url) = &config.site_url {
                request = request.header("HTTP-Referer", site_url);
            }
            if let Some(app_name) = &config.app_name {
                request = request.header("X-Title", app_name);
            }
            request.json(&openrouter::ChatRequest {
                model: config.model.clone(),
                messages: to_wire_messages(conversation),
                max_tokens: MAX_TOKENS,
                stream,
            })
        }
        Provider::Gemini => client
            .post(&config.url)
            .header("x-goog-api-key", &config.api_key)
            .json(&gemini::GenerateRequest {
                contents: gemini::to_contents(conversation),
                generation_config: Some(gemini::GenerationConfig {
                    max_output_tokens: MAX_TOKENS,
                }),
            }),
    }
}

/// Turn a non-2xx response into a user-facing explanation with a hint when
/// the body matches a known condition.
fn describe_http_failure(config: &Config, status: reqwest::StatusCode, body: &str) -> String {
    let mut message = format!("HTTP {status}: {}", format_api_error(body));
    if body.contains("insufficient_quota") || body.contains("credits") {
        message.push_str("\n💡 The account has insufficient credits for this model.");
    } else if body.contains("model_not_found") || body.contains("not found") {
        message.push_str(&format!(
            "\n💡 Model '{}' not found or not available.",
            config.model
        ));
    } else if config.use_streaming && (body.contains("stream") || body.contains("streaming")) {
        message.push_str("\n💡 This model may not support streaming. Try normal chat mode.");
    }
    message
}

fn report_save(conversation: &[Message]) {
    match save_history(conversation) {
        Ok(path) => println!("💾 Conversation history saved to {}", path.display()),
        Err(e) => println!("❌ Error saving conversation history: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(provider: Provider) -> Config {
        Config {
            provider,
            anthropic_version: None,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            url: provider.chat_url("test-model"),
            app_name: Some("trichat".to_string()),
            site_url: Some("https://example.org".to_string()),
            use_streaming: false,
            autosave: false,
        }
    }

    #[tokio::test]
    async fn anthropic_requests_carry_provider_auth_headers() {
        let client = reqwest::Client::new();
        let config = test_config(Provider::Anthropic);
        let request = build_request(&config, &client, &[Message::user("hi")], false)
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers.get("x-api-key").unwrap(), "test-key");
        assert_eq!(
            headers.get("anthropic-version").unwrap(),
            DEFAULT_ANTHROPIC_VERSION
        );
    }

    #[tokio::test]
    async fn openrouter_requests_carry_bearer_and_optional_headers() {
        let client = reqwest::Client::new();
        let config = test_config(Provider::OpenRouter);
        let request = build_request(&config, &client, &[Message::user("hi")], true)
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer test-key");
        assert_eq!(headers.get("HTTP-Referer").unwrap(), "https://example.org");
        assert_eq!(headers.get("X-Title").unwrap(), "trichat");
    }

    #[tokio::test]
    async fn gemini_requests_use_the_goog_api_key_header() {
        let client = reqwest::Client::new();
        let config = test_config(Provider::Gemini);
        let request = build_request(&config, &client, &[Message::user("hi")], false)
            .build()
            .unwrap();

        assert_eq!(request.headers().get("x-goog-api-key").unwrap(), "test-key");
        assert!(request.url().as_str().contains(":generateContent"));
    }

    #[test]
    fn failed_turns_leave_history_untouched() {
        let mut conversation = vec![Message::user("earlier"), Message::assistant("a reply")];

        apply_turn(
            &mut conversation,
            Message::user("next question"),
            TurnResult::Recoverable("HTTP 429: API error: quota exceeded".to_string()),
        );
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1].content, "a reply");

        apply_turn(
            &mut conversation,
            Message::user("next question"),
            TurnResult::Success(Message::assistant("an answer")),
        );
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation[2].content, "next question");
        assert_eq!(conversation[3].content, "an answer");
    }

    #[test]
    fn http_failures_carry_model_hints() {
        let config = test_config(Provider::OpenRouter);
        let status = reqwest::StatusCode::NOT_FOUND;
        let body = r#"{"error":{"message":"No endpoints found","code":404}} not found"#;
        let message = describe_http_failure(&config, status, body);
        assert!(message.contains("404"));
        assert!(message.contains("test-model"));
    }
}
