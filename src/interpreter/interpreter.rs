//! Pure helpers shared across the execution engine: exported-environment
//! construction, errexit triggering rules, exit-code bookkeeping, and the
//! recursion/command-count limit checks. Kept free of any filesystem or
//! process dependency so they're trivial to unit test in isolation.

use std::collections::HashMap;
use crate::ast::types::ScriptNode;
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterState};

/// Callback type used to re-enter the top-level interpreter from inside
/// word expansion (command substitution, `$(...)`) and conditional
/// evaluation without creating a dependency cycle on `execution_engine`.
pub type ExecuteScriptFn = Box<dyn Fn(&ScriptNode, &mut InterpreterState) -> ExecResult>;

/// Build environment record containing only exported variables.
///
/// In bash, only exported variables are passed to child processes.
/// This includes both permanently exported variables (via export/declare -x)
/// and temporarily exported variables (prefix assignments like FOO=bar cmd).
pub fn build_exported_env(state: &InterpreterState) -> HashMap<String, String> {
    let mut all_exported = std::collections::HashSet::new();

    // Add permanently exported variables
    if let Some(ref exported_vars) = state.exported_vars {
        for name in exported_vars {
            all_exported.insert(name.clone());
        }
    }

    // Add temporarily exported variables
    if let Some(ref temp_exported_vars) = state.temp_exported_vars {
        for name in temp_exported_vars {
            all_exported.insert(name.clone());
        }
    }

    if all_exported.is_empty() {
        return HashMap::new();
    }

    let mut env = HashMap::new();
    for name in all_exported {
        if let Some(value) = state.env.get(&name) {
            env.insert(name, value.clone());
        }
    }
    env
}

/// Check if errexit should trigger for the given exit code and context.
///
/// Errexit (set -e) should NOT trigger when:
/// - Command was in a && or || list and wasn't the final command (short-circuit)
/// - Command was negated with !
/// - Command is part of a condition in if/while/until
/// - Exit code came from a compound command where inner execution was errexit-safe
pub fn should_trigger_errexit(
    state: &InterpreterState,
    exit_code: i32,
    was_short_circuited: bool,
    was_negated: bool,
) -> bool {
    state.options.errexit
        && exit_code != 0
        && !was_short_circuited
        && !was_negated
        && !state.in_condition
        && !state.errexit_safe.unwrap_or(false)
}

/// Update the exit code in state after command execution.
pub fn update_exit_code(state: &mut InterpreterState, exit_code: i32) {
    state.last_exit_code = exit_code;
    state.env.insert("?".to_string(), exit_code.to_string());
}

/// Increment command count and check execution limits.
///
/// Returns an error message if the limit is exceeded.
pub fn check_command_limit(state: &mut InterpreterState, limits: &ExecutionLimits) -> Option<String> {
    state.command_count += 1;
    if state.command_count > limits.max_command_count {
        Some(format!(
            "too many commands executed (>{}), increase executionLimits.maxCommandCount",
            limits.max_command_count
        ))
    } else {
        None
    }
}

/// Check recursion depth limit.
///
/// Returns an error message if the limit is exceeded.
pub fn check_recursion_limit(state: &InterpreterState, limits: &ExecutionLimits) -> Option<String> {
    if state.call_depth > limits.max_recursion_depth {
        Some(format!(
            "maximum recursion depth exceeded (>{})",
            limits.max_recursion_depth
        ))
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_exported_env_empty() {
        let state = InterpreterState::default();
        let env = build_exported_env(&state);
        assert!(env.is_empty());
    }

    #[test]
    fn test_build_exported_env_with_exports() {
        let mut state = InterpreterState::default();
        state.env.insert("FOO".to_string(), "bar".to_string());
        state.env.insert("BAZ".to_string(), "qux".to_string());
        state.exported_vars = Some(["FOO".to_string()].into_iter().collect());

        let env = build_exported_env(&state);
        assert_eq!(env.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(env.get("BAZ"), None); // Not exported
    }

    #[test]
    fn test_build_exported_env_with_temp_exports() {
        let mut state = InterpreterState::default();
        state.env.insert("FOO".to_string(), "bar".to_string());
        state.temp_exported_vars = Some(["FOO".to_string()].into_iter().collect());

        let env = build_exported_env(&state);
        assert_eq!(env.get("FOO"), Some(&"bar".to_string()));
    }

    #[test]
    fn test_should_trigger_errexit() {
        let mut state = InterpreterState::default();
        state.options.errexit = true;

        // Should trigger for non-zero exit code
        assert!(should_trigger_errexit(&state, 1, false, false));

        // Should not trigger for zero exit code
        assert!(!should_trigger_errexit(&state, 0, false, false));

        // Should not trigger when short-circuited
        assert!(!should_trigger_errexit(&state, 1, true, false));

        // Should not trigger when negated
        assert!(!should_trigger_errexit(&state, 1, false, true));

        // Should not trigger in condition
        state.in_condition = true;
        assert!(!should_trigger_errexit(&state, 1, false, false));
    }

    #[test]
    fn test_update_exit_code() {
        let mut state = InterpreterState::default();
        update_exit_code(&mut state, 42);
        assert_eq!(state.last_exit_code, 42);
        assert_eq!(state.env.get("?"), Some(&"42".to_string()));
    }

    #[test]
    fn test_check_command_limit() {
        let mut state = InterpreterState::default();
        let limits = ExecutionLimits {
            max_command_count: 10,
            ..Default::default()
        };

        // Should not exceed limit
        for _ in 0..10 {
            assert!(check_command_limit(&mut state, &limits).is_none());
        }

        // Should exceed limit
        assert!(check_command_limit(&mut state, &limits).is_some());
    }

    #[test]
    fn test_check_recursion_limit() {
        let mut state = InterpreterState::default();
        let limits = ExecutionLimits {
            max_recursion_depth: 5,
            ..Default::default()
        };

        state.call_depth = 5;
        assert!(check_recursion_limit(&state, &limits).is_none());

        state.call_depth = 6;
        assert!(check_recursion_limit(&state, &limits).is_some());
    }
}
