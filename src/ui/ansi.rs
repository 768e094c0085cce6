//! ANSI escape sequences used for console presentation.
//!
//! Plain constants rather than a styling library: rendering here is a full
//! clear-then-repaint of a short menu, and unsupported terminals simply show
//! the codes as-is without breaking anything.

pub const CLEAR_SCREEN: &str = "\x1b[2J";
pub const CURSOR_HOME: &str = "\x1b[H";

pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";
pub const REVERSE: &str = "\x1b[7m";

pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

/// Horizontal rule used to frame help and config blocks.
pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
