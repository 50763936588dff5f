use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// The primary "react / start" signal
    Activate,
    ResetSession,
    ClearBest,
    Quit,
}

fn is_activation_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char(' ') | KeyCode::Enter)
}

/// Turns raw key events into edge-triggered commands.
///
/// Auto-repeat is dropped when the terminal labels it (`KeyEventKind::Repeat`).
/// When the terminal also reports releases, a second press of an activation
/// key that was never released is dropped too.
///
/// Without release reporting, auto-repeat arrives as plain presses that cannot
/// be told apart from fresh ones, so a held activation key keeps toggling the
/// round between waiting and false start.
#[derive(Debug, Default)]
pub struct KeyFilter {
    reports_release: bool,
    held: Option<KeyCode>,
}

impl KeyFilter {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            held: None,
        }
    }

    pub fn command(&mut self, key: KeyEvent) -> Option<Command> {
        match key.kind {
            KeyEventKind::Repeat => return None,
            KeyEventKind::Release => {
                if self.held == Some(key.code) {
                    self.held = None;
                }
                return None;
            }
            KeyEventKind::Press => {}
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        match key.code {
            code if is_activation_key(code) => {
                if self.reports_release {
                    if self.held == Some(code) {
                        return None;
                    }
                    self.held = Some(code);
                }
                Some(Command::Activate)
            }
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Char('r') => Some(Command::ResetSession),
            KeyCode::Char('c') => Some(Command::ClearBest),
            _ => None,
        }
    }
}
