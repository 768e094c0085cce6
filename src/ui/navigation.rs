//! Menu navigation state machine.
//!
//! One [`NavigationState`] per `navigate` call, owned by that call — there
//! is no process-wide menu state. The input modality is chosen once per
//! session: key-driven when stdin is a terminal, line-driven otherwise.
//! Descending pushes a frame recording the parent item list and selection,
//! and back-navigation restores that frame exactly, all the way up the
//! stack; going back at the root ends the session.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::debug;

use crate::ui::ansi::{
    BLUE, BOLD, CLEAR_SCREEN, CURSOR_HOME, CYAN, GREEN, RESET, REVERSE, RULE, YELLOW,
};
use crate::ui::menu::{MenuAction, MenuItem};
use crate::ui::terminal::{is_interactive, RawModeGuard};

/// Delay before re-prompting on invalid line input, to avoid flooding the
/// console when stdin is a pipe of garbage.
const PROMPT_THROTTLE: Duration = Duration::from_secs(1);

struct TrailFrame<'a, C> {
    items: &'a [MenuItem<C>],
    selected: usize,
    label: &'a str,
}

pub struct NavigationState<'a, C> {
    title: &'a str,
    items: &'a [MenuItem<C>],
    selected: usize,
    trail: Vec<TrailFrame<'a, C>>,
}

impl<'a, C> NavigationState<'a, C> {
    pub fn new(items: &'a [MenuItem<C>], title: &'a str) -> Self {
        Self {
            title,
            items,
            selected: 0,
            trail: Vec::new(),
        }
    }

    pub fn items(&self) -> &'a [MenuItem<C>] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    /// Root title plus the labels of every branch descended into.
    pub fn breadcrumbs(&self) -> String {
        let mut path = self.title.to_string();
        for frame in &self.trail {
            path.push_str(" > ");
            path.push_str(frame.label);
        }
        path
    }

    pub fn move_up(&mut self) {
        if self.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.items.len() - 1
        } else {
            self.selected - 1
        };
    }

    pub fn move_down(&mut self) {
        if self.is_empty() {
            return;
        }
        self.selected = if self.selected + 1 == self.items.len() {
            0
        } else {
            self.selected + 1
        };
    }

    /// Move the selection to `index` if it is in range.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// Act on the selected item: descend into a branch (returning `None`) or
    /// yield the command of a leaf. The returned reference borrows the menu,
    /// not the state, so callers can clone it and keep navigating.
    pub fn activate(&mut self) -> Option<&'a C> {
        let item = self.items.get(self.selected)?;
        match &item.action {
            MenuAction::Navigate(children) => {
                self.trail.push(TrailFrame {
                    items: self.items,
                    selected: self.selected,
                    label: &item.label,
                });
                self.items = children;
                self.selected = 0;
                None
            }
            MenuAction::Invoke(command) => Some(command),
        }
    }

    /// Descend into the selected item only if it is a branch.
    pub fn descend(&mut self) -> bool {
        match self.items.get(self.selected).map(|item| &item.action) {
            Some(MenuAction::Navigate(_)) => {
                self.activate();
                true
            }
            _ => false,
        }
    }

    /// Pop one trail frame, restoring the parent list and its selection.
    /// Returns false at the root.
    pub fn back(&mut self) -> bool {
        match self.trail.pop() {
            Some(frame) => {
                self.items = frame.items;
                self.selected = frame.selected;
                true
            }
            None => false,
        }
    }
}

/// Run one navigation session over `items` and return the invoked command,
/// or `None` when the user quit without choosing.
pub fn navigate<C: Clone>(items: &[MenuItem<C>], title: &str) -> Option<C> {
    let mut state = NavigationState::new(items, title);

    if is_interactive() {
        match run_key_mode(&mut state) {
            Ok(result) => result,
            Err(e) => {
                debug!("key navigation unavailable, using line mode: {e}");
                run_line_mode(&mut state).unwrap_or_default()
            }
        }
    } else {
        run_line_mode(&mut state).unwrap_or_default()
    }
}

fn run_key_mode<C: Clone>(state: &mut NavigationState<'_, C>) -> io::Result<Option<C>> {
    let _guard = RawModeGuard::acquire()?;

    loop {
        paint(state, false)?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Up => state.move_up(),
            KeyCode::Down => state.move_down(),
            KeyCode::Right => {
                state.descend();
            }
            KeyCode::Left => {
                if !state.back() {
                    return Ok(None);
                }
            }
            KeyCode::Enter => {
                if let Some(command) = state.activate() {
                    return Ok(Some(command.clone()));
                }
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(None),
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as u8 - b'1') as usize;
                if state.jump_to(index) {
                    if let Some(command) = state.activate() {
                        return Ok(Some(command.clone()));
                    }
                }
            }
            _ => {}
        }
    }
}

fn run_line_mode<C: Clone>(state: &mut NavigationState<'_, C>) -> io::Result<Option<C>> {
    loop {
        paint(state, true)?;
        print!("{GREEN}Your choice:{RESET} ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let input = line.trim();

        if ["q", "quit", "esc", "escape"]
            .iter()
            .any(|word| input.eq_ignore_ascii_case(word))
        {
            return Ok(None);
        }

        match input.parse::<usize>() {
            Ok(choice) if (1..=state.len()).contains(&choice) => {
                state.jump_to(choice - 1);
                if let Some(command) = state.activate() {
                    return Ok(Some(command.clone()));
                }
            }
            Ok(_) => {
                println!("{YELLOW}Invalid choice. Please enter 1-{}{RESET}", state.len());
                thread::sleep(PROMPT_THROTTLE);
            }
            Err(_) => {
                println!(
                    "{YELLOW}Please enter a number (1-{}), 'q', or 'esc' to quit{RESET}",
                    state.len()
                );
                thread::sleep(PROMPT_THROTTLE);
            }
        }
    }
}

/// Full repaint: clear, home, then redraw everything. No partial updates.
fn paint<C>(state: &NavigationState<'_, C>, numbered: bool) -> io::Result<()> {
    let mut out = io::stdout();
    // Raw mode needs explicit carriage returns.
    let newline = if numbered { "\n" } else { "\r\n" };
    write!(out, "{CLEAR_SCREEN}{CURSOR_HOME}")?;
    for line in render_lines(state, numbered) {
        write!(out, "{line}{newline}")?;
    }
    out.flush()
}

fn render_lines<C>(state: &NavigationState<'_, C>, numbered: bool) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{BOLD}{CYAN}=== trichat ==={RESET}"));
    lines.push(format!("{BLUE}📍 {}{RESET}", state.breadcrumbs()));
    lines.push(String::new());

    for (index, item) in state.items().iter().enumerate() {
        let submenu_marker = if item.is_branch() {
            format!(" {GREEN}→{RESET}")
        } else {
            String::new()
        };
        let line = if numbered {
            format!(
                "{BOLD}{GREEN}{}.{RESET} {YELLOW}{}{RESET}{submenu_marker}",
                index + 1,
                item.label
            )
        } else if index == state.selected() {
            format!(
                "{REVERSE}{BOLD} ► {RESET} {}. {BOLD}{YELLOW}{}{RESET}{submenu_marker}",
                index + 1,
                item.label
            )
        } else {
            format!("    {}. {}{submenu_marker}", index + 1, item.label)
        };
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("{CYAN}{RULE}{RESET}"));
    if numbered {
        lines.push(format!(
            "{BLUE}Navigation:{RESET} Enter number (1-{}) | Q/Esc to quit",
            state.len()
        ));
    } else {
        lines.push(format!(
            "{BLUE}Navigation:{RESET} ↑/↓ Select | Enter Confirm | →/← Submenu | Q/Esc Quit"
        ));
        if let Some(item) = state.items().get(state.selected()) {
            if item.is_branch() {
                lines.push(format!("{GREEN}→ Press → or Enter to open this submenu{RESET}"));
            } else {
                lines.push(format!("{YELLOW}Press Enter to choose this item{RESET}"));
            }
        }
    }
    lines
}
