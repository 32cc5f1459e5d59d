//! `PromptRenderer`: the collaborator the line editor asks for the prompt
//! string before each line. Kept as a trait seam per SPEC_FULL.md §1
//! ("external collaborators specified only by the interfaces the core
//! uses") so an embedder can swap in a themed/async prompt without the
//! editor knowing the difference.

use crate::interpreter::types::InterpreterState;

pub trait PromptRenderer {
    fn render(&self, state: &InterpreterState, format: &str) -> String;
}

/// Default `PS1`-style renderer: expands `\u` (user), `\h` (short
/// hostname), `\w`/`\W` (cwd/basename), `\$` (`#` for uid 0 else `$`), and
/// `\n`. Unrecognised escapes pass through literally.
#[derive(Debug, Clone, Default)]
pub struct DefaultPromptRenderer;

impl PromptRenderer for DefaultPromptRenderer {
    fn render(&self, state: &InterpreterState, format: &str) -> String {
        let mut out = String::with_capacity(format.len());
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('u') => out.push_str(&whoami_user()),
                Some('h') => out.push_str(&short_hostname()),
                Some('w') => out.push_str(&display_cwd(state)),
                Some('W') => {
                    let cwd = display_cwd(state);
                    let base = cwd.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("/");
                    out.push_str(base);
                }
                Some('$') => out.push(if is_root() { '#' } else { '$' }),
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }

        out
    }
}

fn whoami_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "user".to_string())
}

fn short_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname").ok().map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

fn display_cwd(state: &InterpreterState) -> String {
    if let Some(home) = std::env::var("HOME").ok() {
        if let Some(rest) = state.cwd.strip_prefix(&home) {
            if rest.is_empty() {
                return "~".to_string();
            }
            if rest.starts_with('/') {
                return format!("~{}", rest);
            }
        }
    }
    state.cwd.clone()
}

fn is_root() -> bool {
    // SAFETY: `geteuid` takes no arguments and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_dollar_for_non_root() {
        let state = InterpreterState::default();
        let renderer = DefaultPromptRenderer;
        let rendered = renderer.render(&state, "\\$ ");
        assert!(rendered == "$ " || rendered == "# ");
    }

    #[test]
    fn passes_through_unknown_escape() {
        let state = InterpreterState::default();
        let renderer = DefaultPromptRenderer;
        assert_eq!(renderer.render(&state, "\\q"), "\\q");
    }

    #[test]
    fn expands_w_to_cwd() {
        let mut state = InterpreterState::default();
        state.cwd = "/tmp/project".to_string();
        let renderer = DefaultPromptRenderer;
        assert_eq!(renderer.render(&state, "\\w> "), "/tmp/project> ");
    }
}
