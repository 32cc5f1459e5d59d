//! alias / unalias - define and remove command aliases.
//!
//! Aliases live in `state.aliases`, lazily initialized on first use (the
//! same `Option<HashMap<...>>` pattern the rest of the interpreter state
//! uses for features not every script touches).

use std::collections::HashMap;

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_alias(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        let mut stdout = String::new();
        if let Some(aliases) = &state.aliases {
            let mut names: Vec<&String> = aliases.keys().collect();
            names.sort();
            for name in names {
                stdout.push_str(&format!("alias {}='{}'\n", name, aliases[name].replace('\'', "'\\''")));
            }
        }
        return BuiltinResult { stdout, stderr: String::new(), exit_code: 0 };
    }

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;

    for arg in args {
        if let Some(eq) = arg.find('=') {
            let name = &arg[..eq];
            let value = &arg[eq + 1..];
            let value = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')).unwrap_or(value);
            let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
            state.aliases.get_or_insert_with(HashMap::new).insert(name.to_string(), value.to_string());
        } else if let Some(value) = state.aliases.as_ref().and_then(|a| a.get(arg)) {
            stdout.push_str(&format!("alias {}='{}'\n", arg, value.replace('\'', "'\\''")));
        } else {
            stderr.push_str(&format!("bash: alias: {}: not found\n", arg));
            exit_code = 1;
        }
    }

    BuiltinResult { stdout, stderr, exit_code }
}

pub fn handle_unalias(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.iter().any(|a| a == "-a") {
        if let Some(aliases) = &mut state.aliases {
            aliases.clear();
        }
        return BuiltinResult::ok();
    }

    let mut stderr = String::new();
    let mut exit_code = 0;
    for name in args {
        let removed = state.aliases.as_mut().map(|a| a.remove(name).is_some()).unwrap_or(false);
        if !removed {
            stderr.push_str(&format!("bash: unalias: `{}': not found\n", name));
            exit_code = 1;
        }
    }
    BuiltinResult { stdout: String::new(), stderr, exit_code }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_list_alias() {
        let mut state = InterpreterState::default();
        handle_alias(&mut state, &["ll=ls -l".to_string()]);
        let r = handle_alias(&mut state, &[]);
        assert!(r.stdout.contains("alias ll='ls -l'"));
    }

    #[test]
    fn unalias_removes_entry() {
        let mut state = InterpreterState::default();
        handle_alias(&mut state, &["ll=ls -l".to_string()]);
        let r = handle_unalias(&mut state, &["ll".to_string()]);
        assert_eq!(r.exit_code, 0);
        assert!(state.aliases.as_ref().unwrap().is_empty());
    }

    #[test]
    fn unalias_unknown_reports_error() {
        let mut state = InterpreterState::default();
        let r = handle_unalias(&mut state, &["nope".to_string()]);
        assert_eq!(r.exit_code, 1);
    }
}
