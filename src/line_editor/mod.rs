//! Hand-rolled line editor (SPEC_FULL.md §4.6): raw-mode terminal, echo
//! off, a buffer/cursor/undo-stack/kill-ring, emacs-like key bindings, and
//! a reverse-incremental-search state machine. Not a wrapper around an
//! existing readline-alike crate — `crossterm` supplies raw mode and event
//! reading only; everything above that (keymap, editing, history
//! interaction, completion ranking) is implemented here.

pub mod completion;
pub mod keymap;
pub mod kill_ring;
pub mod plugin;
pub mod prompt;
pub mod search;

use std::io::{self, Write};

use crossterm::cursor;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

use crate::interpreter::types::InterpreterState;
use crate::state::History;

pub use completion::{CompletionEngine, DirScanCompletion};
pub use keymap::EditCommand;
pub use kill_ring::KillRing;
pub use plugin::{NoPlugins, PluginRegistry};
pub use prompt::{DefaultPromptRenderer, PromptRenderer};
pub use search::SearchState;

/// RAII guard: enables raw mode on construction, disables it on drop (even
/// on panic/early return), so a terminal is never left in a broken state
/// when the editor exits.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// What `LineEditor::read_line` returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLineOutcome {
    /// The user accepted a line (`Enter`).
    Accepted(String),
    /// `Ctrl-D` on an empty buffer: end of input.
    Eof,
    /// `Ctrl-C`: current line discarded, caller should print a fresh prompt.
    Interrupted,
}

/// One interactive line-reading session's mutable state. Constructed fresh
/// per `read_line` call; `Shell` owns the long-lived collaborators
/// (history, config, completion engine) across calls.
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    kill_ring: KillRing,
    undo_stack: Vec<(Vec<char>, usize)>,
    search: SearchState,
    /// Index into history while paging with `C-p`/`C-n`/Up/Down; `None`
    /// means the buffer is the not-yet-submitted current line.
    history_cursor: Option<usize>,
    /// Buffer saved when paging into history, restored on return to it.
    pending_line: Vec<char>,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            kill_ring: KillRing::new(),
            undo_stack: Vec::new(),
            search: SearchState::Idle,
            history_cursor: None,
            pending_line: Vec::new(),
        }
    }

    fn snapshot(&mut self) {
        self.undo_stack.push((self.buffer.clone(), self.cursor));
        if self.undo_stack.len() > 200 {
            self.undo_stack.remove(0);
        }
    }

    fn undo(&mut self) {
        if let Some((buf, cur)) = self.undo_stack.pop() {
            self.buffer = buf;
            self.cursor = cur.min(self.buffer.len());
        }
    }

    fn word_left(&self) -> usize {
        let mut i = self.cursor;
        while i > 0 && self.buffer[i - 1].is_whitespace() {
            i -= 1;
        }
        while i > 0 && !self.buffer[i - 1].is_whitespace() {
            i -= 1;
        }
        i
    }

    fn word_right(&self) -> usize {
        let mut i = self.cursor;
        let len = self.buffer.len();
        while i < len && self.buffer[i].is_whitespace() {
            i += 1;
        }
        while i < len && !self.buffer[i].is_whitespace() {
            i += 1;
        }
        i
    }

    /// Read one line interactively. `prompt_format` is the raw `PS1`-style
    /// string; it is re-rendered by `renderer` every redraw (so `\w` tracks
    /// `state.cwd` live, matching bash).
    pub fn read_line(
        &mut self,
        state: &InterpreterState,
        history: &History,
        prompt_format: &str,
        renderer: &dyn PromptRenderer,
        completion: &dyn CompletionEngine,
        key_bindings: &std::collections::HashMap<String, String>,
    ) -> io::Result<ReadLineOutcome> {
        let _raw = RawModeGuard::enter()?;
        self.buffer.clear();
        self.cursor = 0;
        self.history_cursor = None;
        self.search = SearchState::Idle;

        let mut stdout = io::stdout();
        self.redraw(&mut stdout, state, history, prompt_format, renderer)?;

        loop {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let cmd = keymap::dispatch(key, key_bindings);
                    match self.apply(cmd, state, history, completion) {
                        Some(ReadLineOutcome::Accepted(line)) => {
                            execute!(stdout, Print("\r\n"))?;
                            return Ok(ReadLineOutcome::Accepted(line));
                        }
                        Some(outcome) => {
                            execute!(stdout, Print("\r\n"))?;
                            return Ok(outcome);
                        }
                        None => {}
                    }
                    self.redraw(&mut stdout, state, history, prompt_format, renderer)?;
                }
                Event::Resize(_, _) => {
                    self.redraw(&mut stdout, state, history, prompt_format, renderer)?;
                }
                _ => {}
            }
        }
    }

    /// Apply one dispatched command to the buffer/cursor/search state.
    /// Returns `Some` when the read loop should end.
    fn apply(
        &mut self,
        cmd: EditCommand,
        state: &InterpreterState,
        history: &History,
        completion: &dyn CompletionEngine,
    ) -> Option<ReadLineOutcome> {
        if self.search.is_active() {
            return self.apply_in_search(cmd, history);
        }

        match cmd {
            EditCommand::Insert(c) => {
                self.snapshot();
                self.buffer.insert(self.cursor, c);
                self.cursor += 1;
            }
            EditCommand::MoveLeft => self.cursor = self.cursor.saturating_sub(1),
            EditCommand::MoveRight => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            EditCommand::MoveBeginningOfLine => self.cursor = 0,
            EditCommand::MoveEndOfLine => self.cursor = self.buffer.len(),
            EditCommand::MoveWordLeft => self.cursor = self.word_left(),
            EditCommand::MoveWordRight => self.cursor = self.word_right(),
            EditCommand::DeleteCharBackward => {
                if self.cursor > 0 {
                    self.snapshot();
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                }
            }
            EditCommand::DeleteCharForward => {
                if self.cursor < self.buffer.len() {
                    self.snapshot();
                    self.buffer.remove(self.cursor);
                }
            }
            EditCommand::KillLineForward => {
                self.snapshot();
                let killed: String = self.buffer.drain(self.cursor..).collect();
                self.kill_ring.kill(killed);
            }
            EditCommand::KillLineBackward => {
                self.snapshot();
                let killed: String = self.buffer.drain(..self.cursor).collect();
                self.kill_ring.kill_append_front(killed);
                self.cursor = 0;
            }
            EditCommand::KillWordBackward => {
                let start = self.word_left();
                self.snapshot();
                let killed: String = self.buffer.drain(start..self.cursor).collect();
                self.kill_ring.kill_append_front(killed);
                self.cursor = start;
            }
            EditCommand::Yank => {
                if let Some(text) = self.kill_ring.yank() {
                    self.snapshot();
                    for (offset, c) in text.chars().enumerate() {
                        self.buffer.insert(self.cursor + offset, c);
                    }
                    self.cursor += text.chars().count();
                }
            }
            EditCommand::TransposeChars => {
                if self.cursor > 0 && self.buffer.len() > 1 {
                    self.snapshot();
                    let i = self.cursor.min(self.buffer.len() - 1).max(1);
                    self.buffer.swap(i - 1, i);
                    self.cursor = (i + 1).min(self.buffer.len());
                }
            }
            EditCommand::ClearScreen => {
                let mut stdout = io::stdout();
                let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
            }
            EditCommand::HistoryPrev => self.page_history_prev(history),
            EditCommand::HistoryNext => self.page_history_next(history),
            EditCommand::ReverseSearch => self.search.start(),
            EditCommand::Complete => self.complete(state, completion),
            EditCommand::Undo => self.undo(),
            EditCommand::Accept => {
                return Some(ReadLineOutcome::Accepted(self.buffer.iter().collect()));
            }
            EditCommand::Interrupt => return Some(ReadLineOutcome::Interrupted),
            EditCommand::Eof => {
                if self.buffer.is_empty() {
                    return Some(ReadLineOutcome::Eof);
                }
            }
            EditCommand::None => {}
        }
        None
    }

    fn apply_in_search(&mut self, cmd: EditCommand, history: &History) -> Option<ReadLineOutcome> {
        match cmd {
            EditCommand::Insert(c) => self.search.push_char(c, history),
            EditCommand::DeleteCharBackward => self.search.pop_char(history),
            EditCommand::ReverseSearch => self.search.search_again(history),
            EditCommand::Interrupt => self.search.cancel(),
            EditCommand::Accept => {
                let line = self.search.matched_line(history).map(str::to_string);
                self.search.cancel();
                if let Some(line) = line {
                    self.buffer = line.chars().collect();
                    self.cursor = self.buffer.len();
                }
                return None;
            }
            _ => {
                // Any other key (arrows, etc.) ends the search, keeping the match.
                let line = self.search.matched_line(history).map(str::to_string);
                self.search.cancel();
                if let Some(line) = line {
                    self.buffer = line.chars().collect();
                    self.cursor = self.buffer.len();
                }
            }
        }
        None
    }

    fn page_history_prev(&mut self, history: &History) {
        if history.is_empty() {
            return;
        }
        let next_index = match self.history_cursor {
            None => {
                self.pending_line = self.buffer.clone();
                history.len()
            }
            Some(i) if i > 1 => i - 1,
            Some(i) => i,
        };
        if let Some(line) = history.get(next_index) {
            self.buffer = line.chars().collect();
            self.cursor = self.buffer.len();
            self.history_cursor = Some(next_index);
        }
    }

    fn page_history_next(&mut self, history: &History) {
        match self.history_cursor {
            None => {}
            Some(i) if i < history.len() => {
                let next_index = i + 1;
                if let Some(line) = history.get(next_index) {
                    self.buffer = line.chars().collect();
                    self.cursor = self.buffer.len();
                    self.history_cursor = Some(next_index);
                }
            }
            Some(_) => {
                self.buffer = std::mem::take(&mut self.pending_line);
                self.cursor = self.buffer.len();
                self.history_cursor = None;
            }
        }
    }

    /// Tab completion: classify + rank via `completion`, replacing the
    /// current word with the sole match, or the longest common prefix of
    /// several (cycling through candidates on repeated `Tab` is left to the
    /// caller's terminal scroll-back — this crate completes one step per
    /// press).
    fn complete(&mut self, state: &InterpreterState, completion: &dyn CompletionEngine) {
        let line: String = self.buffer.iter().collect();
        let matches = completion.complete(state, &line, self.cursor);
        let Some(first) = matches.first() else { return };

        let word_start = line[..self.cursor]
            .rfind(|c: char| c.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);
        let replacement = if matches.len() == 1 {
            first.clone()
        } else {
            longest_common_prefix(&matches)
        };

        self.snapshot();
        let word_start_chars = line[..word_start].chars().count();
        let word_end_chars = self.cursor;
        self.buffer.splice(word_start_chars..word_end_chars, replacement.chars());
        self.cursor = word_start_chars + replacement.chars().count();
    }

    fn redraw(
        &self,
        stdout: &mut io::Stdout,
        state: &InterpreterState,
        history: &History,
        prompt_format: &str,
        renderer: &dyn PromptRenderer,
    ) -> io::Result<()> {
        let prompt = if let SearchState::Searching { query, .. } = &self.search {
            let matched = self.search.matched_line(history).unwrap_or("");
            format!("(reverse-i-search)`{}': {}", query, matched)
        } else {
            renderer.render(state, prompt_format)
        };
        let line: String = self.buffer.iter().collect();

        queue!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine), Print(&prompt), Print(&line))?;
        let col = (prompt.chars().count() + self.cursor) as u16;
        queue!(stdout, cursor::MoveToColumn(col))?;
        stdout.flush()
    }
}

fn longest_common_prefix(candidates: &[String]) -> String {
    let mut iter = candidates.iter();
    let Some(first) = iter.next() else { return String::new() };
    let mut prefix: Vec<char> = first.chars().collect();
    for candidate in iter {
        let chars: Vec<char> = candidate.chars().collect();
        let mut i = 0;
        while i < prefix.len() && i < chars.len() && prefix[i] == chars[i] {
            i += 1;
        }
        prefix.truncate(i);
        if prefix.is_empty() {
            break;
        }
    }
    prefix.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_common_prefix_of_divergent_names() {
        let candidates = vec!["cargo".to_string(), "cargo-fmt".to_string(), "cat".to_string()];
        assert_eq!(longest_common_prefix(&candidates), "ca");
    }

    #[test]
    fn insert_and_delete_keep_cursor_in_bounds() {
        let mut editor = LineEditor::new();
        editor.snapshot();
        editor.buffer = vec!['a', 'b', 'c'];
        editor.cursor = 3;
        editor.apply(EditCommand::DeleteCharBackward, &InterpreterState::default(), &History::default(), &DirScanCompletion::default());
        assert_eq!(editor.buffer, vec!['a', 'b']);
        assert_eq!(editor.cursor, 2);
    }

    #[test]
    fn undo_restores_previous_buffer() {
        let mut editor = LineEditor::new();
        let state = InterpreterState::default();
        let history = History::default();
        let completion = DirScanCompletion::default();
        editor.apply(EditCommand::Insert('a'), &state, &history, &completion);
        editor.apply(EditCommand::Insert('b'), &state, &history, &completion);
        editor.apply(EditCommand::Undo, &state, &history, &completion);
        assert_eq!(editor.buffer, vec!['a']);
    }

    #[test]
    fn kill_line_forward_then_yank_reinserts() {
        let mut editor = LineEditor::new();
        let state = InterpreterState::default();
        let history = History::default();
        let completion = DirScanCompletion::default();
        editor.buffer = vec!['h', 'i', '!'];
        editor.cursor = 2;
        editor.apply(EditCommand::KillLineForward, &state, &history, &completion);
        assert_eq!(editor.buffer, vec!['h', 'i']);
        editor.apply(EditCommand::Yank, &state, &history, &completion);
        assert_eq!(editor.buffer.iter().collect::<String>(), "hi!");
    }

    #[test]
    fn accept_returns_buffer_contents() {
        let mut editor = LineEditor::new();
        let state = InterpreterState::default();
        let history = History::default();
        let completion = DirScanCompletion::default();
        editor.buffer = "echo hi".chars().collect();
        editor.cursor = editor.buffer.len();
        let outcome = editor.apply(EditCommand::Accept, &state, &history, &completion);
        assert_eq!(outcome, Some(ReadLineOutcome::Accepted("echo hi".to_string())));
    }
}
