//! Emacs-like default key bindings (SPEC_FULL.md §4.6). `Config::key_bindings`
//! can override individual entries by binding name; unlisted bindings keep
//! these defaults.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// One editing action the line editor's main loop dispatches on. Distinct
/// from `KeyEvent` so the keymap and the editor's command handling stay
/// decoupled — a config override just has to produce one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Insert(char),
    MoveLeft,
    MoveRight,
    MoveBeginningOfLine,
    MoveEndOfLine,
    MoveWordLeft,
    MoveWordRight,
    DeleteCharBackward,
    DeleteCharForward,
    KillLineForward,
    KillLineBackward,
    KillWordBackward,
    Yank,
    TransposeChars,
    ClearScreen,
    HistoryPrev,
    HistoryNext,
    ReverseSearch,
    Complete,
    Undo,
    Accept,
    Interrupt,
    Eof,
    None,
}

/// Binding name used in `Config::key_bindings`, e.g. `"ctrl-r"`.
pub fn binding_name(key: &KeyEvent) -> String {
    let mut name = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        name.push_str("ctrl-");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        name.push_str("alt-");
    }
    match key.code {
        KeyCode::Char(c) => name.push(c.to_ascii_lowercase()),
        KeyCode::Left => name.push_str("left"),
        KeyCode::Right => name.push_str("right"),
        KeyCode::Up => name.push_str("up"),
        KeyCode::Down => name.push_str("down"),
        KeyCode::Backspace => name.push_str("backspace"),
        KeyCode::Delete => name.push_str("delete"),
        KeyCode::Tab => name.push_str("tab"),
        KeyCode::Enter => name.push_str("enter"),
        _ => name.push_str("unknown"),
    }
    name
}

/// Look up a command by its config-facing name (used by `Config::key_bindings`
/// overrides).
pub fn command_by_name(name: &str) -> Option<EditCommand> {
    Some(match name {
        "beginning-of-line" => EditCommand::MoveBeginningOfLine,
        "end-of-line" => EditCommand::MoveEndOfLine,
        "forward-char" => EditCommand::MoveRight,
        "backward-char" => EditCommand::MoveLeft,
        "forward-word" => EditCommand::MoveWordRight,
        "backward-word" => EditCommand::MoveWordLeft,
        "backward-delete-char" => EditCommand::DeleteCharBackward,
        "delete-char" => EditCommand::DeleteCharForward,
        "kill-line" => EditCommand::KillLineForward,
        "unix-line-discard" => EditCommand::KillLineBackward,
        "backward-kill-word" => EditCommand::KillWordBackward,
        "yank" => EditCommand::Yank,
        "transpose-chars" => EditCommand::TransposeChars,
        "clear-screen" => EditCommand::ClearScreen,
        "previous-history" => EditCommand::HistoryPrev,
        "next-history" => EditCommand::HistoryNext,
        "reverse-search-history" => EditCommand::ReverseSearch,
        "complete" => EditCommand::Complete,
        "undo" => EditCommand::Undo,
        "accept-line" => EditCommand::Accept,
        _ => return None,
    })
}

/// Default emacs-mode dispatch, consulting `overrides` (parsed from
/// `Config::key_bindings`) before falling back to the built-in table.
pub fn dispatch(key: KeyEvent, overrides: &std::collections::HashMap<String, String>) -> EditCommand {
    let name = binding_name(&key);
    if let Some(override_name) = overrides.get(&name) {
        if let Some(cmd) = command_by_name(override_name) {
            return cmd;
        }
    }

    use KeyCode::*;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match (key.code, ctrl, alt) {
        (Char('c'), true, _) => EditCommand::Interrupt,
        (Char('d'), true, _) => EditCommand::Eof,
        (Char('a'), true, _) => EditCommand::MoveBeginningOfLine,
        (Char('e'), true, _) => EditCommand::MoveEndOfLine,
        (Char('b'), true, _) => EditCommand::MoveLeft,
        (Char('f'), true, _) => EditCommand::MoveRight,
        (Char('h'), true, _) => EditCommand::DeleteCharBackward,
        (Char('k'), true, _) => EditCommand::KillLineForward,
        (Char('u'), true, _) => EditCommand::KillLineBackward,
        (Char('w'), true, _) => EditCommand::KillWordBackward,
        (Char('y'), true, _) => EditCommand::Yank,
        (Char('t'), true, _) => EditCommand::TransposeChars,
        (Char('l'), true, _) => EditCommand::ClearScreen,
        (Char('p'), true, _) => EditCommand::HistoryPrev,
        (Char('n'), true, _) => EditCommand::HistoryNext,
        (Char('r'), true, _) => EditCommand::ReverseSearch,
        (Char('b'), false, true) => EditCommand::MoveWordLeft,
        (Char('f'), false, true) => EditCommand::MoveWordRight,
        (Left, ..) => EditCommand::MoveLeft,
        (Right, ..) => EditCommand::MoveRight,
        (Home, ..) => EditCommand::MoveBeginningOfLine,
        (End, ..) => EditCommand::MoveEndOfLine,
        (Up, ..) => EditCommand::HistoryPrev,
        (Down, ..) => EditCommand::HistoryNext,
        (Backspace, ..) => EditCommand::DeleteCharBackward,
        (Delete, ..) => EditCommand::DeleteCharForward,
        (Tab, ..) => EditCommand::Complete,
        (Enter, ..) => EditCommand::Accept,
        (Char(c), false, false) => EditCommand::Insert(c),
        _ => EditCommand::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers, kind: KeyEventKind::Press, state: crossterm::event::KeyEventState::NONE }
    }

    #[test]
    fn ctrl_r_dispatches_reverse_search() {
        let overrides = std::collections::HashMap::new();
        let cmd = dispatch(key(KeyCode::Char('r'), KeyModifiers::CONTROL), &overrides);
        assert_eq!(cmd, EditCommand::ReverseSearch);
    }

    #[test]
    fn plain_char_inserts() {
        let overrides = std::collections::HashMap::new();
        let cmd = dispatch(key(KeyCode::Char('x'), KeyModifiers::NONE), &overrides);
        assert_eq!(cmd, EditCommand::Insert('x'));
    }

    #[test]
    fn override_rebinds_ctrl_k() {
        let mut overrides = std::collections::HashMap::new();
        overrides.insert("ctrl-k".to_string(), "beginning-of-line".to_string());
        let cmd = dispatch(key(KeyCode::Char('k'), KeyModifiers::CONTROL), &overrides);
        assert_eq!(cmd, EditCommand::MoveBeginningOfLine);
    }
}
