//! history - Display or manipulate the command history list

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use std::path::PathBuf;

fn histfile(state: &InterpreterState) -> Option<PathBuf> {
    state.env.get("HISTFILE").map(PathBuf::from)
}

/// `history [-c] [-d offset] [-a|-r|-w] [filename] [n]`
pub fn handle_history(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                state.history.clear();
                i += 1;
                continue;
            }
            "-d" => {
                let Some(spec) = args.get(i + 1) else {
                    return BuiltinResult::failure("bash: history: -d: option requires an argument\n", 2);
                };
                let Ok(offset) = spec.parse::<usize>() else {
                    return BuiltinResult::failure(
                        &format!("bash: history: {}: history position out of range\n", spec),
                        1,
                    );
                };
                if state.history.remove(offset).is_none() {
                    return BuiltinResult::failure(
                        &format!("bash: history: {}: history position out of range\n", offset),
                        1,
                    );
                }
                i += 2;
                continue;
            }
            "-a" | "-w" => {
                let path = args.get(i + 1).map(PathBuf::from).or_else(|| histfile(state));
                let Some(path) = path else {
                    return BuiltinResult::failure("bash: history: HISTFILE not set\n", 1);
                };
                let result = if args[i] == "-a" {
                    state.history.append_new_to_file(&path)
                } else {
                    state.history.write_to_file(&path)
                };
                if let Err(e) = result {
                    return BuiltinResult::failure(&format!("bash: history: {}: {}\n", path.display(), e), 1);
                }
                i += if args.get(i + 1).is_some() { 2 } else { 1 };
                continue;
            }
            "-r" => {
                let path = args.get(i + 1).map(PathBuf::from).or_else(|| histfile(state));
                let Some(path) = path else {
                    return BuiltinResult::failure("bash: history: HISTFILE not set\n", 1);
                };
                if let Err(e) = state.history.load_from_file(&path) {
                    return BuiltinResult::failure(&format!("bash: history: {}: {}\n", path.display(), e), 1);
                }
                i += if args.get(i + 1).is_some() { 2 } else { 1 };
                continue;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return BuiltinResult::failure(&format!("bash: history: {}: invalid option\n", arg), 2);
            }
            _ => break,
        }
    }

    let count = args.get(i).and_then(|s| s.parse::<usize>().ok());
    let total = state.history.len();
    let start = match count {
        Some(n) if n < total => total - n,
        _ => 0,
    };

    let mut stdout = String::new();
    for (idx, entry) in state.history.iter().enumerate().skip(start) {
        stdout.push_str(&format!("{:5}  {}\n", idx + 1, entry.line));
    }
    BuiltinResult { stdout, stderr: String::new(), exit_code: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_entries_with_numbers() {
        let mut state = InterpreterState::default();
        state.history.push("echo a".into());
        state.history.push("echo b".into());
        let result = handle_history(&mut state, &[]);
        assert_eq!(result.stdout, "    1  echo a\n    2  echo b\n");
    }

    #[test]
    fn limits_to_last_n() {
        let mut state = InterpreterState::default();
        state.history.push("one".into());
        state.history.push("two".into());
        state.history.push("three".into());
        let result = handle_history(&mut state, &["2".to_string()]);
        assert_eq!(result.stdout, "    2  two\n    3  three\n");
    }

    #[test]
    fn dash_c_clears() {
        let mut state = InterpreterState::default();
        state.history.push("echo a".into());
        let result = handle_history(&mut state, &["-c".to_string()]);
        assert_eq!(result.exit_code, 0);
        assert!(state.history.is_empty());
    }

    #[test]
    fn dash_d_removes_entry() {
        let mut state = InterpreterState::default();
        state.history.push("echo a".into());
        state.history.push("echo b".into());
        let result = handle_history(&mut state, &["-d".to_string(), "1".to_string()]);
        assert_eq!(result.exit_code, 0);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.get(1), Some("echo b"));
    }
}
