pub mod chat_stream;
pub mod config;
pub mod error;
pub mod message;
pub mod providers;
