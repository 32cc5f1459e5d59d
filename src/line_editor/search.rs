//! Reverse-incremental-search (`C-r`) state machine: `idle -> searching(query)
//! -> match(query, index)`, per SPEC_FULL.md §4.6. Each keystroke while
//! searching either extends the query (re-searching from the current match
//! backward) or, on a repeated `C-r`, continues to the next older match for
//! the same query.

use crate::state::History;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching { query: String, index: Option<usize> },
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState::Idle
    }
}

impl SearchState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SearchState::Idle)
    }

    pub fn start(&mut self) {
        *self = SearchState::Searching { query: String::new(), index: None };
    }

    pub fn cancel(&mut self) {
        *self = SearchState::Idle;
    }

    /// Current matched line, if any.
    pub fn matched_line<'h>(&self, history: &'h History) -> Option<&'h str> {
        match self {
            SearchState::Searching { index: Some(i), .. } => history.get(*i),
            _ => None,
        }
    }

    /// Append a character to the query and re-search from the most recent
    /// entry backward.
    pub fn push_char(&mut self, c: char, history: &History) {
        if let SearchState::Searching { query, index } = self {
            query.push(c);
            *index = search_from(history, query, history.len() + 1);
        }
    }

    pub fn pop_char(&mut self, history: &History) {
        if let SearchState::Searching { query, index } = self {
            query.pop();
            *index = search_from(history, query, history.len() + 1);
        }
    }

    /// Repeated `C-r`: find the next older match for the same query.
    pub fn search_again(&mut self, history: &History) {
        if let SearchState::Searching { query, index } = self {
            if query.is_empty() {
                return;
            }
            let start = index.unwrap_or(history.len() + 1);
            *index = search_from(history, query, start);
        }
    }
}

/// 1-based index search for `needle` strictly before `before_index`,
/// walking from most recent to oldest (matches `History::rsearch_contains`
/// semantics but bounded, so repeated `C-r` can keep walking backward).
fn search_from(history: &History, needle: &str, before_index: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut i = before_index.saturating_sub(1);
    while i >= 1 {
        if let Some(line) = history.get(i) {
            if line.contains(needle) {
                return Some(i);
            }
        }
        i -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> History {
        let mut h = History::new(10);
        h.push("echo one".into());
        h.push("git status".into());
        h.push("echo two".into());
        h
    }

    #[test]
    fn idle_by_default() {
        assert_eq!(SearchState::default(), SearchState::Idle);
    }

    #[test]
    fn start_then_push_char_finds_most_recent_match() {
        let history = sample_history();
        let mut state = SearchState::Idle;
        state.start();
        state.push_char('e', &history);
        state.push_char('c', &history);
        state.push_char('h', &history);
        assert_eq!(state.matched_line(&history), Some("echo two"));
    }

    #[test]
    fn repeated_search_again_walks_to_older_match() {
        let history = sample_history();
        let mut state = SearchState::Idle;
        state.start();
        state.push_char('e', &history);
        state.push_char('c', &history);
        state.push_char('h', &history);
        assert_eq!(state.matched_line(&history), Some("echo two"));
        state.search_again(&history);
        assert_eq!(state.matched_line(&history), Some("echo one"));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut state = SearchState::Idle;
        state.start();
        state.cancel();
        assert_eq!(state, SearchState::Idle);
    }
}
