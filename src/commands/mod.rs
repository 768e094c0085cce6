//! Slash-command parsing for the chat loop.
//!
//! The command set is closed, so parsing is a single first-match scan.
//! Anything that is not a recognized command becomes a literal message.

use crate::ui::ansi::{BLUE, BOLD, CYAN, GREEN, RESET, RULE, YELLOW};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Empty input or `/menu` / `/back`.
    BackToMenu,
    /// `/exit` / `/quit`; triggers autosave when enabled.
    ExitApp,
    /// `/help` / `?`; never added to the conversation.
    Help,
    /// `/clear` truncates the history.
    Clear,
    /// `/config` shows the active configuration.
    ShowConfig,
    /// `/save` writes the history to a timestamped file.
    Save,
    /// `/load` prompts for a path and replaces the history.
    Load,
    /// A literal chat message (already trimmed).
    Message(String),
}

pub fn parse_chat_input(input: &str) -> ChatCommand {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return ChatCommand::BackToMenu;
    }

    let matches_any = |aliases: &[&str]| aliases.iter().any(|a| trimmed.eq_ignore_ascii_case(a));

    if matches_any(&["/menu", "/back"]) {
        ChatCommand::BackToMenu
    } else if matches_any(&["/exit", "/quit"]) {
        ChatCommand::ExitApp
    } else if matches_any(&["/help", "?"]) {
        ChatCommand::Help
    } else if matches_any(&["/clear"]) {
        ChatCommand::Clear
    } else if matches_any(&["/config"]) {
        ChatCommand::ShowConfig
    } else if matches_any(&["/save"]) {
        ChatCommand::Save
    } else if matches_any(&["/load"]) {
        ChatCommand::Load
    } else {
        ChatCommand::Message(trimmed.to_string())
    }
}

pub fn print_chat_help() {
    println!("\n{CYAN}{RULE}{RESET}");
    println!("{BOLD}{BLUE}💬 Chat Commands:{RESET}");
    println!("  {GREEN}/menu{RESET} or {GREEN}/back{RESET}  - Return to main menu");
    println!("  {GREEN}/exit{RESET} or {GREEN}/quit{RESET}  - Exit application");
    println!("  {GREEN}/help{RESET} or {GREEN}?{RESET}      - Show this help");
    println!("  {GREEN}/clear{RESET}          - Clear conversation history");
    println!("  {GREEN}/config{RESET}         - Show current configuration");
    println!("  {GREEN}/save{RESET}           - Save conversation history to a file");
    println!("  {GREEN}/load{RESET}           - Load conversation history from a file");
    println!("  {GREEN}[Enter]{RESET}         - Return to main menu (empty message)");
    println!("  {YELLOW}Type any message to chat with the AI model{RESET}");
    println!("{CYAN}{RULE}{RESET}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_back_to_menu() {
        assert_eq!(parse_chat_input(""), ChatCommand::BackToMenu);
        assert_eq!(parse_chat_input("   "), ChatCommand::BackToMenu);
        assert_eq!(parse_chat_input("\t\n"), ChatCommand::BackToMenu);
    }

    #[test]
    fn menu_aliases_return_back_to_menu() {
        assert_eq!(parse_chat_input("/menu"), ChatCommand::BackToMenu);
        assert_eq!(parse_chat_input("/back"), ChatCommand::BackToMenu);
        assert_eq!(parse_chat_input("/MENU"), ChatCommand::BackToMenu);
        assert_eq!(parse_chat_input("/Back"), ChatCommand::BackToMenu);
    }

    #[test]
    fn exit_aliases_return_exit() {
        assert_eq!(parse_chat_input("/exit"), ChatCommand::ExitApp);
        assert_eq!(parse_chat_input("/quit"), ChatCommand::ExitApp);
        assert_eq!(parse_chat_input("/EXIT"), ChatCommand::ExitApp);
    }

    #[test]
    fn help_aliases_return_help() {
        assert_eq!(parse_chat_input("/help"), ChatCommand::Help);
        assert_eq!(parse_chat_input("?"), ChatCommand::Help);
        assert_eq!(parse_chat_input("/HELP"), ChatCommand::Help);
    }

    #[test]
    fn session_commands_parse() {
        assert_eq!(parse_chat_input("/clear"), ChatCommand::Clear);
        assert_eq!(parse_chat_input("/config"), ChatCommand::ShowConfig);
        assert_eq!(parse_chat_input("/save"), ChatCommand::Save);
        assert_eq!(parse_chat_input("/load"), ChatCommand::Load);
    }

    #[test]
    fn normal_messages_are_trimmed_literals() {
        assert_eq!(
            parse_chat_input("Hello"),
            ChatCommand::Message("Hello".to_string())
        );
        assert_eq!(
            parse_chat_input("  hi  "),
            ChatCommand::Message("hi".to_string())
        );
        // An unknown slash word is a message, not a silent no-op.
        assert_eq!(
            parse_chat_input("/frobnicate"),
            ChatCommand::Message("/frobnicate".to_string())
        );
    }
}
