//! trap - register actions for signals and pseudo-signals.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::{InterpreterState, TrapAction};

const PSEUDO_SIGNALS: &[&str] = &["EXIT", "DEBUG", "ERR", "RETURN"];

fn canonical_signal_name(name: &str) -> String {
    let upper = name.to_uppercase();
    if PSEUDO_SIGNALS.contains(&upper.as_str()) {
        return upper;
    }
    if let Ok(n) = name.parse::<i32>() {
        return match n {
            0 => "EXIT".to_string(),
            1 => "HUP".to_string(),
            2 => "INT".to_string(),
            3 => "QUIT".to_string(),
            6 => "ABRT".to_string(),
            9 => "KILL".to_string(),
            13 => "PIPE".to_string(),
            14 => "ALRM".to_string(),
            15 => "TERM".to_string(),
            _ => upper,
        };
    }
    upper.strip_prefix("SIG").map(String::from).unwrap_or(upper)
}

pub fn handle_trap(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() || args == ["-p"] {
        let mut stdout = String::new();
        let mut names: Vec<&String> = state.traps.keys().collect();
        names.sort();
        for name in names {
            match &state.traps[name] {
                TrapAction::Ignore => stdout.push_str(&format!("trap -- '' {}\n", name)),
                TrapAction::Command(cmd) => {
                    stdout.push_str(&format!("trap -- '{}' {}\n", cmd.replace('\'', "'\\''"), name));
                }
            }
        }
        return BuiltinResult { stdout, stderr: String::new(), exit_code: 0 };
    }

    if args[0] == "-l" {
        let names = ["HUP", "INT", "QUIT", "ILL", "TRAP", "ABRT", "BUS", "FPE", "KILL",
            "USR1", "SEGV", "USR2", "PIPE", "ALRM", "TERM", "CHLD", "CONT", "STOP", "TSTP"];
        let stdout = names.iter().enumerate().map(|(i, n)| format!("{}) SIG{}", i + 1, n)).collect::<Vec<_>>().join("\n") + "\n";
        return BuiltinResult { stdout, stderr: String::new(), exit_code: 0 };
    }

    if args[0] == "-" {
        for sig in &args[1..] {
            state.traps.remove(&canonical_signal_name(sig));
        }
        return BuiltinResult::ok();
    }

    // `trap` with only signal names (no action) resets them to default.
    if args.iter().all(|a| a.parse::<i32>().is_ok() || PSEUDO_SIGNALS.contains(&a.to_uppercase().as_str())) {
        for sig in args {
            state.traps.remove(&canonical_signal_name(sig));
        }
        return BuiltinResult::ok();
    }

    let action_str = &args[0];
    let action = if action_str.is_empty() { TrapAction::Ignore } else { TrapAction::Command(action_str.clone()) };
    for sig in &args[1..] {
        state.traps.insert(canonical_signal_name(sig), action.clone());
    }
    BuiltinResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_list_exit_trap() {
        let mut state = InterpreterState::default();
        handle_trap(&mut state, &["echo bye".to_string(), "EXIT".to_string()]);
        let r = handle_trap(&mut state, &[]);
        assert!(r.stdout.contains("trap -- 'echo bye' EXIT"));
    }

    #[test]
    fn dash_removes_trap() {
        let mut state = InterpreterState::default();
        handle_trap(&mut state, &["echo hi".to_string(), "INT".to_string()]);
        handle_trap(&mut state, &["-".to_string(), "INT".to_string()]);
        assert!(!state.traps.contains_key("INT"));
    }

    #[test]
    fn empty_action_ignores_signal() {
        let mut state = InterpreterState::default();
        handle_trap(&mut state, &["".to_string(), "INT".to_string()]);
        assert!(matches!(state.traps.get("INT"), Some(TrapAction::Ignore)));
    }
}
