//! On-disk configuration: a JSON-with-comments file carrying prompt format,
//! history size, theme, alias map, environment-variable map, and key
//! bindings (SPEC_FULL.md §6). Loaded once at startup from the first match
//! of a fixed search path, mirroring the "first match of a fixed path list"
//! convention common to CLI config loaders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Typed shape of the on-disk config file. Every field is optional so a
/// config can set only the pieces it cares about; absent fields keep
/// [`Config::default`]'s values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `PS1`-style prompt format string. `\w`/`\W`/`\u`/`\h`/`\$` are
    /// expanded by [`crate::line_editor::prompt::render`].
    pub prompt: String,
    /// `HISTSIZE` — max in-memory history entries.
    pub history_size: usize,
    /// `HISTFILE` path, `~`-relative allowed.
    pub history_file: Option<String>,
    /// Color theme name; the line editor looks this up in a small built-in
    /// table (`"plain"` disables ANSI colour entirely).
    pub theme: String,
    /// Aliases installed at startup, same shape as the `alias` builtin's
    /// table (`state.aliases`).
    pub aliases: HashMap<String, String>,
    /// Environment variables exported at startup, applied before `PATH`
    /// lookup so they're visible to the first command run.
    pub env: HashMap<String, String>,
    /// Key binding overrides: binding name (e.g. `"ctrl-r"`) to emacs
    /// command name (e.g. `"reverse-search-history"`). Unset bindings keep
    /// [`crate::line_editor::keymap`]'s defaults.
    pub key_bindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: "\\u@\\h:\\w\\$ ".to_string(),
            history_size: 500,
            history_file: None,
            theme: "plain".to_string(),
            aliases: HashMap::new(),
            env: HashMap::new(),
            key_bindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Fixed search path, first match wins: `$DEN_CONFIG` env override,
    /// then `~/.config/den/config.json`, then `~/.denrc.json`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var("DEN_CONFIG") {
            paths.push(PathBuf::from(explicit));
        }
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            paths.push(home.join(".config").join("den").join("config.json"));
            paths.push(home.join(".denrc.json"));
        }
        paths
    }

    /// Load the first config file that exists along [`Config::search_paths`],
    /// falling back to [`Config::default`] if none do (or the first one
    /// found is unreadable/malformed — a broken config must never block
    /// shell startup).
    pub fn load() -> Self {
        for path in Self::search_paths() {
            if path.is_file() {
                match Self::load_from(&path) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("den: {}: {}", path.display(), e);
                        return Self::default();
                    }
                }
            }
        }
        Self::default()
    }

    /// Parse a specific config file, stripping `//` and `/* */` comments
    /// first (JSONC — `serde_json` itself has no comment support).
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let stripped = strip_jsonc_comments(&raw);
        serde_json::from_str(&stripped).map_err(|e| e.to_string())
    }
}

/// Strip `//line` and `/* block */` comments outside of string literals.
/// Good enough for a hand-authored config file; not a general JSON5 parser.
fn strip_jsonc_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_sane_prompt_and_history_size() {
        let cfg = Config::default();
        assert_eq!(cfg.history_size, 500);
        assert!(cfg.prompt.contains("\\w"));
    }

    #[test]
    fn strip_jsonc_comments_keeps_string_slashes() {
        let input = r#"{
            // a comment
            "prompt": "a // not a comment",
            /* block
               comment */
            "history_size": 10
        }"#;
        let stripped = strip_jsonc_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed["prompt"], "a // not a comment");
        assert_eq!(parsed["history_size"], 10);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let err = Config::load_from(Path::new("/nonexistent/den/config.json"));
        assert!(err.is_err());
    }

    #[test]
    fn load_from_parses_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "prompt": "$ ", "aliases": {"ll": "ls -l"} }"#).unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.prompt, "$ ");
        assert_eq!(cfg.aliases.get("ll").map(String::as_str), Some("ls -l"));
    }
}
