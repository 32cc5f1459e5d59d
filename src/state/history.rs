//! Command history
//!
//! Bounded in-memory ring buffer (`HISTSIZE`) with on-disk persistence
//! (`HISTFILE`/`HISTFILESIZE`), matching the separation bash makes between
//! the live history list and the history file that `history -a`/`history -r`/
//! `history -w` read and write.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// One entry in the history ring buffer (`fc`/`history`/reverse-incremental
/// search).
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub line: String,
}

/// Bounded history ring buffer. Oldest entries drop off once `HISTSIZE` is
/// exceeded, matching bash's in-memory history list (not the history *file*,
/// which `history -a`/`history -r` read and write separately).
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    pub max_size: usize,
    /// Index (into `entries`) of the first entry not yet appended to the
    /// history file by `history -a`.
    written: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self { entries: Vec::new(), max_size, written: 0 }
    }

    pub fn push(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        if self.max_size == 0 {
            return;
        }
        self.entries.push(HistoryEntry { line });
        while self.entries.len() > self.max_size {
            self.entries.remove(0);
            self.written = self.written.saturating_sub(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.written = 0;
    }

    /// 1-based `fc`/`history -d` style indexing.
    pub fn get(&self, n: usize) -> Option<&str> {
        self.entries.get(n.checked_sub(1)?).map(|e| e.line.as_str())
    }

    pub fn remove(&mut self, n: usize) -> Option<HistoryEntry> {
        if n == 0 || n > self.entries.len() {
            return None;
        }
        self.written = self.written.min(n - 1);
        Some(self.entries.remove(n - 1))
    }

    /// Most recent match whose line starts with `prefix`, for reverse search.
    pub fn rsearch_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries.iter().rev().find(|e| e.line.starts_with(prefix)).map(|e| e.line.as_str())
    }

    /// Most recent match containing `needle` anywhere, for Ctrl-R incremental
    /// search.
    pub fn rsearch_contains(&self, needle: &str) -> Option<&str> {
        if needle.is_empty() {
            return None;
        }
        self.entries.iter().rev().find(|e| e.line.contains(needle)).map(|e| e.line.as_str())
    }

    /// Load history lines from `path` (`history -r` / startup load), oldest
    /// line first, appending to whatever is already in the ring.
    pub fn load_from_file(&mut self, path: &Path) -> io::Result<()> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        for line in contents.lines() {
            self.push(line.to_string());
        }
        self.written = self.entries.len();
        Ok(())
    }

    /// Overwrite `path` with the entire in-memory history (`history -w`).
    pub fn write_to_file(&mut self, path: &Path) -> io::Result<()> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.line);
            out.push('\n');
        }
        fs::write(path, out)?;
        self.written = self.entries.len();
        Ok(())
    }

    /// Append only the lines added since the last `-a`/`-w`/load (`history -a`).
    pub fn append_new_to_file(&mut self, path: &Path) -> io::Result<()> {
        if self.written >= self.entries.len() {
            return Ok(());
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        for entry in &self.entries[self.written..] {
            writeln!(file, "{}", entry.line)?;
        }
        self.written = self.entries.len();
        Ok(())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn push_respects_max_size() {
        let mut h = History::new(2);
        h.push("one".into());
        h.push("two".into());
        h.push("three".into());
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(1), Some("two"));
        assert_eq!(h.get(2), Some("three"));
    }

    #[test]
    fn ignores_blank_lines() {
        let mut h = History::new(10);
        h.push("  ".into());
        assert!(h.is_empty());
    }

    #[test]
    fn rsearch_prefix_finds_most_recent() {
        let mut h = History::new(10);
        h.push("echo a".into());
        h.push("echo b".into());
        assert_eq!(h.rsearch_prefix("echo"), Some("echo b"));
    }

    #[test]
    fn write_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bash_history");
        let mut h = History::new(10);
        h.push("ls -la".into());
        h.push("cd /tmp".into());
        h.write_to_file(&path).unwrap();

        let mut h2 = History::new(10);
        h2.load_from_file(&path).unwrap();
        assert_eq!(h2.len(), 2);
        assert_eq!(h2.get(1), Some("ls -la"));
    }

    #[test]
    fn append_new_only_writes_unwritten_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bash_history");
        let mut h = History::new(10);
        h.push("one".into());
        h.append_new_to_file(&path).unwrap();
        h.push("two".into());
        h.append_new_to_file(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }
}
