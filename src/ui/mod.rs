pub mod ansi;
pub mod chat_loop;
pub mod menu;
pub mod navigation;
pub mod terminal;
