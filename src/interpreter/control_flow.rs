//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - while loops
//! - until loops
//! - case statements (terminator type only; matching lives in `execution_engine`)
//! - break/continue (level bookkeeping)

use regex_lite::Regex;

use crate::ast::types::StatementNode;
use crate::interpreter::errors::{ControlFlowError, InterpreterError};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::types::{ExecResult, InterpreterState};

pub use crate::ast::types::CaseTerminator;

/// Validate that a variable name is a valid identifier.
/// Returns true if valid, false otherwise.
pub fn is_valid_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Result of running a loop to completion.
#[derive(Debug, Default)]
pub struct ForResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ForResult {
    fn append(&mut self, result: &ExecResult) {
        self.stdout.push_str(&result.stdout);
        self.stderr.push_str(&result.stderr);
        self.exit_code = result.exit_code;
    }
}

/// Outcome of one pass over a loop body, after translating break/continue
/// control-flow errors consumed at this nesting level.
enum BodyOutcome {
    Continue,
    Break,
}

fn run_loop_body<B>(
    state: &mut InterpreterState,
    body: &[&StatementNode],
    result: &mut ForResult,
    exec_body: &mut B,
) -> Result<BodyOutcome, InterpreterError>
where
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    for stmt in body {
        match exec_body(state, stmt) {
            Ok(res) => result.append(&res),
            Err(InterpreterError::Break(mut e)) => {
                e.prepend_output(&result.stdout, &result.stderr);
                result.stdout = e.stdout.clone();
                result.stderr = e.stderr.clone();
                if e.levels > 1 {
                    e.levels -= 1;
                    return Err(InterpreterError::Break(e));
                }
                return Ok(BodyOutcome::Break);
            }
            Err(InterpreterError::Continue(mut e)) => {
                e.prepend_output(&result.stdout, &result.stderr);
                result.stdout = e.stdout.clone();
                result.stderr = e.stderr.clone();
                if e.levels > 1 {
                    e.levels -= 1;
                    return Err(InterpreterError::Continue(e));
                }
                return Ok(BodyOutcome::Continue);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(BodyOutcome::Continue)
}

/// Execute an `if`/`elif`/`else` chain. `clauses` is the list of
/// (condition statements, body statements) pairs in source order; the
/// first clause whose condition exits 0 has its body executed.
pub fn execute_if<C, B>(
    state: &mut InterpreterState,
    clauses: &[(Vec<&StatementNode>, Vec<&StatementNode>)],
    else_body: Option<&[&StatementNode]>,
    mut eval_condition: C,
    mut exec_body: B,
) -> Result<ExecResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();

    for (condition, body) in clauses {
        let mut cond_exit = 0;
        let was_in_condition = state.in_condition;
        state.in_condition = true;
        for stmt in condition {
            let res = eval_condition(state, stmt);
            state.in_condition = was_in_condition;
            let res = res?;
            state.in_condition = true;
            stdout.push_str(&res.stdout);
            stderr.push_str(&res.stderr);
            cond_exit = res.exit_code;
        }
        state.in_condition = was_in_condition;

        if cond_exit == 0 {
            let mut exit_code = 0;
            for stmt in body {
                let res = exec_body(state, stmt)?;
                stdout.push_str(&res.stdout);
                stderr.push_str(&res.stderr);
                exit_code = res.exit_code;
            }
            return Ok(ExecResult::new(stdout, stderr, exit_code));
        }
    }

    if let Some(else_stmts) = else_body {
        let mut exit_code = 0;
        for stmt in else_stmts {
            let res = exec_body(state, stmt)?;
            stdout.push_str(&res.stdout);
            stderr.push_str(&res.stderr);
            exit_code = res.exit_code;
        }
        return Ok(ExecResult::new(stdout, stderr, exit_code));
    }

    Ok(ExecResult::new(stdout, stderr, 0))
}

/// Execute a `for name in words; do body; done` loop.
pub fn execute_for<B>(
    state: &mut InterpreterState,
    variable: &str,
    words: &[String],
    body: &[&StatementNode],
    max_iterations: u64,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    state.loop_depth += 1;
    let mut iterations: u64 = 0;

    for word in words {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth -= 1;
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    format!("too many loop iterations (>{})", max_iterations),
                    crate::interpreter::errors::LimitType::Iterations,
                ),
            ));
        }

        state.env.insert(variable.to_string(), word.clone());

        match run_loop_body(state, body, &mut result, &mut exec_body) {
            Ok(BodyOutcome::Continue) => {}
            Ok(BodyOutcome::Break) => break,
            Err(e) => {
                state.loop_depth -= 1;
                return Err(e);
            }
        }
    }

    state.loop_depth -= 1;
    Ok(result)
}

/// Execute a `while condition; do body; done` loop.
pub fn execute_while<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    mut eval_condition: C,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_conditional_loop(state, condition, body, max_iterations, true, &mut eval_condition, &mut exec_body)
}

/// Execute an `until condition; do body; done` loop.
pub fn execute_until<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    mut eval_condition: C,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_conditional_loop(state, condition, body, max_iterations, false, &mut eval_condition, &mut exec_body)
}

fn run_conditional_loop<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    keep_going_while_zero: bool,
    eval_condition: &mut C,
    exec_body: &mut B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    state.loop_depth += 1;
    let mut iterations: u64 = 0;

    loop {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth -= 1;
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    format!("too many loop iterations (>{})", max_iterations),
                    crate::interpreter::errors::LimitType::Iterations,
                ),
            ));
        }

        let mut cond_exit = 0;
        let was_in_condition = state.in_condition;
        state.in_condition = true;
        for stmt in condition {
            let res = match eval_condition(state, stmt) {
                Ok(res) => res,
                Err(e) => {
                    state.in_condition = was_in_condition;
                    state.loop_depth -= 1;
                    return Err(e);
                }
            };
            result.stdout.push_str(&res.stdout);
            result.stderr.push_str(&res.stderr);
            cond_exit = res.exit_code;
        }
        state.in_condition = was_in_condition;

        let should_run = if keep_going_while_zero { cond_exit == 0 } else { cond_exit != 0 };
        if !should_run {
            break;
        }

        match run_loop_body(state, body, &mut result, exec_body) {
            Ok(BodyOutcome::Continue) => {}
            Ok(BodyOutcome::Break) => break,
            Err(e) => {
                state.loop_depth -= 1;
                return Err(e);
            }
        }
    }

    state.loop_depth -= 1;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_bar"));
        assert!(is_valid_identifier("foo123"));
        assert!(is_valid_identifier("_123"));
        assert!(!is_valid_identifier("123foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo bar"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_case_terminator_variants() {
        assert_eq!(CaseTerminator::DoubleSemi, CaseTerminator::DoubleSemi);
        assert_ne!(CaseTerminator::DoubleSemi, CaseTerminator::SemiAnd);
    }

    #[test]
    fn test_execute_for_basic() {
        let mut state = InterpreterState::default();
        let words = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = execute_for(&mut state, "i", &words, &[], 1000, |_state, _stmt| {
            Ok(ExecResult::ok())
        })
        .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(state.env.get("i"), Some(&"c".to_string()));
    }

    #[test]
    fn test_execute_while_hits_iteration_limit() {
        // An empty condition list has no statement to report non-zero, so
        // the loop runs until the iteration cap kicks in.
        let mut state = InterpreterState::default();
        let result = execute_while(
            &mut state,
            &[],
            &[],
            5,
            |_state, _stmt| Ok(ConditionResult::failure()),
            |_state, _stmt| Ok(ExecResult::ok()),
        );
        assert!(matches!(result, Err(InterpreterError::ExecutionLimit(_))));
    }
}
