//! `CompletionEngine`: the line editor's tab-completion collaborator
//! (SPEC_FULL.md §4.6). Kept as a trait seam so `compgen`/`complete`-
//! registered specs (`state.completion_specs`) can drive completion for a
//! specific command without the editor itself knowing about builtins.
//!
//! The default implementation classifies the word under the cursor
//! (command position, file argument, directory argument, variable,
//! command-specific wordlist), scans candidates, and ranks them. Directory
//! scans for file/dir completion fan out across a worker pool sized to CPU
//! count, merging into one `Mutex`-guarded result vector — the only
//! parallelism in the core (SPEC_FULL.md §5).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::interpreter::types::InterpreterState;

/// Where in the command line the word being completed sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    CommandPosition,
    FileArgument,
    DirectoryArgument,
    Variable,
    CommandSpecific { command: String },
}

/// Classify the cursor position within `line` (byte offset `cursor`) for
/// completion purposes: first word (and no `=`-prefixed assignment before
/// it) is command position; a `$`/`${` prefix is a variable; otherwise an
/// argument, refined to directory-argument for commands that only take
/// directories (`cd`, `pushd`, `rmdir`) unless a `complete`-registered spec
/// says otherwise.
pub fn classify(line: &str, cursor: usize, specs: &HashMap<String, crate::interpreter::types::CompletionSpec>) -> CompletionContext {
    let before = &line[..cursor.min(line.len())];
    let mut words = before.split_whitespace().peekable();
    let first_word = words.next();
    let is_command_position = first_word.is_none() || (words.peek().is_none() && !before.ends_with(' '));

    let current_word = before.rsplit(|c: char| c.is_whitespace()).next().unwrap_or("");
    if current_word.starts_with('$') {
        return CompletionContext::Variable;
    }

    if is_command_position {
        return CompletionContext::CommandPosition;
    }

    let command = first_word.unwrap_or("").to_string();
    if specs.contains_key(&command) {
        return CompletionContext::CommandSpecific { command };
    }
    match command.as_str() {
        "cd" | "pushd" | "rmdir" => CompletionContext::DirectoryArgument,
        _ => CompletionContext::FileArgument,
    }
}

/// Score a candidate against `prefix` for ranking: exact match first, then
/// prefix (start) match, then substring ("consecutive-match"), then
/// word-boundary match (candidate has a `-`/`_`-separated segment starting
/// with the prefix), else no match. Lower is better; `None` excludes the
/// candidate.
fn score(candidate: &str, prefix: &str) -> Option<u8> {
    if prefix.is_empty() {
        return Some(3);
    }
    if candidate == prefix {
        Some(0)
    } else if candidate.starts_with(prefix) {
        Some(1)
    } else if candidate.contains(prefix) {
        Some(2)
    } else if candidate.split(['-', '_', '/']).any(|seg| seg.starts_with(prefix)) {
        Some(3)
    } else {
        None
    }
}

/// Rank candidates: by score, then lexicographically. Directories get a
/// trailing `/` for display (caller passes `is_dir` via the tuple).
pub fn rank(candidates: Vec<(String, bool)>, prefix: &str) -> Vec<String> {
    let mut scored: Vec<(u8, String, bool)> = candidates
        .into_iter()
        .filter_map(|(name, is_dir)| score(&name, prefix).map(|s| (s, name, is_dir)))
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    scored
        .into_iter()
        .map(|(_, name, is_dir)| if is_dir { format!("{}/", name) } else { name })
        .collect()
}

pub trait CompletionEngine {
    fn complete(&self, state: &InterpreterState, line: &str, cursor: usize) -> Vec<String>;
}

/// Default engine: classifies context, then dispatches to the matching
/// candidate source.
pub struct DirScanCompletion {
    pool_size: usize,
}

impl Default for DirScanCompletion {
    fn default() -> Self {
        Self { pool_size: num_cpus::get().max(1) }
    }
}

impl CompletionEngine for DirScanCompletion {
    fn complete(&self, state: &InterpreterState, line: &str, cursor: usize) -> Vec<String> {
        let specs = state.completion_specs.clone().unwrap_or_default();
        let context = classify(line, cursor, &specs);
        let current_word = line[..cursor.min(line.len())]
            .rsplit(|c: char| c.is_whitespace())
            .next()
            .unwrap_or("");

        match context {
            CompletionContext::Variable => {
                let prefix = current_word.trim_start_matches('$');
                let mut names: Vec<(String, bool)> =
                    state.env.keys().map(|k| (format!("${}", k), false)).collect();
                names.retain(|(n, _)| n.trim_start_matches('$').starts_with(prefix) || prefix.is_empty());
                rank(names, &format!("${}", prefix))
            }
            CompletionContext::CommandPosition => {
                let mut names: Vec<(String, bool)> = state.functions.keys().map(|k| (k.clone(), false)).collect();
                if let Some(aliases) = &state.aliases {
                    names.extend(aliases.keys().map(|k| (k.clone(), false)));
                }
                let path = state.env.get("PATH").cloned().unwrap_or_default();
                let dirs: Vec<String> = path.split(':').filter(|d| !d.is_empty()).map(String::from).collect();
                names.extend(self.scan_path_parallel(&dirs).into_iter().map(|n| (n, false)));
                rank(names, current_word)
            }
            CompletionContext::CommandSpecific { command } => {
                let wordlist = specs
                    .get(&command)
                    .and_then(|s| s.wordlist.as_ref())
                    .map(|w| w.split_whitespace().map(|s| (s.to_string(), false)).collect())
                    .unwrap_or_default();
                rank(wordlist, current_word)
            }
            CompletionContext::DirectoryArgument => {
                rank(self.scan_dir(state, current_word, true), current_word)
            }
            CompletionContext::FileArgument => {
                rank(self.scan_dir(state, current_word, false), current_word)
            }
        }
    }
}

impl DirScanCompletion {
    /// Resolve the (possibly mid-word) path prefix to its containing
    /// directory and scan it for completion candidates.
    fn scan_dir(&self, state: &InterpreterState, prefix: &str, dirs_only: bool) -> Vec<(String, bool)> {
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        let base = if dir_part.is_empty() {
            state.cwd.clone()
        } else if dir_part.starts_with('/') {
            dir_part.to_string()
        } else {
            format!("{}/{}", state.cwd, dir_part)
        };
        read_dir_entries(Path::new(&base), dirs_only)
            .into_iter()
            .map(|(name, is_dir)| (format!("{}{}", dir_part, name), is_dir))
            .collect()
    }

    /// Scan every `PATH` directory for executables, one worker per entry,
    /// bounded to `pool_size` concurrent scans and merged under one mutex —
    /// the worker pool SPEC_FULL.md §4.6/§5 calls for.
    fn scan_path_parallel(&self, path_dirs: &[String]) -> Vec<String> {
        let results = Arc::new(Mutex::new(Vec::new()));
        let chunks: Vec<&[String]> = path_dirs.chunks(path_dirs.len().div_ceil(self.pool_size).max(1)).collect();
        std::thread::scope(|scope| {
            for chunk in chunks {
                let results = Arc::clone(&results);
                scope.spawn(move || {
                    let mut found = Vec::new();
                    for dir in chunk {
                        for (name, is_dir) in read_dir_entries(Path::new(dir), false) {
                            if !is_dir && is_executable(&Path::new(dir).join(&name)) {
                                found.push(name);
                            }
                        }
                    }
                    results.lock().unwrap().extend(found);
                });
            }
        });
        Arc::try_unwrap(results).unwrap().into_inner().unwrap()
    }
}

fn read_dir_entries(dir: &Path, dirs_only: bool) -> Vec<(String, bool)> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if dirs_only && !is_dir {
                return None;
            }
            Some((e.file_name().to_string_lossy().into_owned(), is_dir))
        })
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_first_word_is_command_position() {
        let specs = HashMap::new();
        assert_eq!(classify("ec", 2, &specs), CompletionContext::CommandPosition);
    }

    #[test]
    fn classify_cd_argument_is_directory() {
        let specs = HashMap::new();
        assert_eq!(classify("cd sr", 5, &specs), CompletionContext::DirectoryArgument);
    }

    #[test]
    fn classify_dollar_prefix_is_variable() {
        let specs = HashMap::new();
        assert_eq!(classify("echo $HO", 8, &specs), CompletionContext::Variable);
    }

    #[test]
    fn rank_prefers_exact_then_prefix_then_substring() {
        let candidates = vec![
            ("subdir".to_string(), true),
            ("sub".to_string(), false),
            ("mysub".to_string(), false),
        ];
        let ranked = rank(candidates, "sub");
        assert_eq!(ranked, vec!["sub", "subdir/", "mysub"]);
    }
}
