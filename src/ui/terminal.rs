//! Terminal mode gateway.
//!
//! Raw mode is only ever held through [`RawModeGuard`], so every exit path
//! out of a navigation session — return, error, or panic unwind — restores
//! cooked mode. Detection failures degrade to line-based input; nothing in
//! here crashes the process.

use std::io::{self, stdin};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;

/// True iff stdin is a real terminal that can deliver raw key events.
pub fn is_interactive() -> bool {
    stdin().is_tty()
}

/// Scoped raw-mode acquisition.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Nothing useful to do if this fails; the process is on its way out
        // of raw mode regardless.
        let _ = disable_raw_mode();
    }
}
