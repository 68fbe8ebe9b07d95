//! Key bindings: arrows, Z/X rotate, Enter start/pause, M mute.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    /// Only meaningful in name entry (previous character).
    Up,
    Rotate,
    /// Start a game, or toggle pause while one is running.
    Start,
    ToggleMute,
    Quit,
    None,
}

/// Map key event to game action. Both rotate keys share one clockwise turn.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Char('z' | 'Z' | 'x' | 'X') => Action::Rotate,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Start,
        KeyCode::Char('m' | 'M') => Action::ToggleMute,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}
