//! Trichat: a menu-driven terminal chat client for LLM APIs.
//!
//! The crate is split along the same seams as the binary's runtime phases:
//!
//! - [`cli`] — argument parsing, startup menu, and configuration flow
//! - [`core`] — configuration, providers, messages, and the SSE stream decoder
//! - [`api`] — per-provider wire types and the OpenRouter model catalog
//! - [`commands`] — slash-command parsing for the chat session
//! - [`ui`] — menus, keyboard navigation, and the chat loop itself

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
