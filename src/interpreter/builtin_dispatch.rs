//! Builtin Command Dispatch
//!
//! Routes a resolved command name to its real handler in
//! `interpreter::builtins::*`. Returns `None` when the name isn't a builtin
//! at all, signalling the caller to fall through to function lookup and then
//! external command resolution.

use crate::interpreter::builtins::*;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::result::test_result;
use crate::interpreter::types::{ExecResult, InterpreterState};

fn br_to_exec(r: BuiltinResult) -> ExecResult {
    ExecResult::new(r.stdout, r.stderr, r.exit_code)
}

/// Dispatch a command to the appropriate builtin handler.
/// Returns `None` if `command_name` is not a shell builtin at all.
pub fn dispatch_builtin(
    state: &mut InterpreterState,
    command_name: &str,
    args: &[String],
    stdin: &str,
    stdin_source_fd: i32,
) -> Option<Result<ExecResult, InterpreterError>> {
    let result = match command_name {
        ":" | "true" => Ok(ExecResult::ok()),
        "false" => Ok(test_result(false)),

        "export" => Ok(br_to_exec(handle_export(state, args))),
        "readonly" => Ok(br_to_exec(handle_readonly(state, args))),
        "unset" => Ok(handle_unset(state, args)),
        "local" => Ok(handle_local(state, args)),
        "declare" | "typeset" => Ok(br_to_exec(handle_declare(state, args))),

        "set" => handle_set(state, args).map(br_to_exec),
        "shift" => handle_shift(state, args).map(br_to_exec),
        "shopt" => Ok(br_to_exec(handle_shopt(state, args))),

        "break" => handle_break(state, args).map(br_to_exec),
        "continue" => handle_continue(state, args).map(br_to_exec),
        "return" => handle_return(state, args).map(br_to_exec),
        "exit" => {
            match handle_exit(state, args) {
                Ok(_) => unreachable!("handle_exit always returns Err"),
                Err(e) => Err(e),
            }
        }

        "cd" => Ok(handle_cd(state, args)),
        "pwd" => {
            let physical = args.iter().any(|a| a == "-P");
            let path = if physical {
                std::fs::canonicalize(&state.cwd)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| state.cwd.clone())
            } else {
                state.cwd.clone()
            };
            Ok(ExecResult::new(format!("{}\n", path), String::new(), 0))
        }

        "read" => Ok(br_to_exec(handle_read(state, args, stdin, stdin_source_fd))),
        "mapfile" | "readarray" => Ok(br_to_exec(handle_mapfile(state, args, stdin))),
        "let" => Ok(br_to_exec(handle_let(state, args))),
        "getopts" => Ok(br_to_exec(handle_getopts(state, args))),

        "pushd" => Ok(br_to_exec(handle_pushd(state, args))),
        "popd" => Ok(br_to_exec(handle_popd(state, args))),
        "dirs" => Ok(br_to_exec(handle_dirs(state, args))),

        "hash" => Ok(br_to_exec(handle_hash(state, args))),
        "compgen" => Ok(br_to_exec(handle_compgen(state, args))),
        "complete" => Ok(br_to_exec(handle_complete(state, args))),
        "compopt" => Ok(br_to_exec(handle_compopt(state, args))),
        "help" => Ok(br_to_exec(handle_help(args))),

        "alias" => Ok(br_to_exec(handle_alias(state, args))),
        "unalias" => Ok(br_to_exec(handle_unalias(state, args))),

        "jobs" => Ok(br_to_exec(handle_jobs(state, args))),
        "wait" => Ok(br_to_exec(handle_wait(state, args))),
        "kill" => Ok(br_to_exec(handle_kill(state, args))),
        "disown" => Ok(br_to_exec(handle_disown(state, args))),
        "fg" => Ok(br_to_exec(handle_fg(state, args))),
        "bg" => Ok(br_to_exec(handle_bg(state, args))),

        "trap" => Ok(br_to_exec(handle_trap(state, args))),
        "umask" => Ok(br_to_exec(handle_umask(state, args))),
        "times" => Ok(br_to_exec(handle_times(state, args))),
        "history" => Ok(br_to_exec(handle_history(state, args))),
        "ulimit" => Ok(br_to_exec(handle_ulimit(state, args))),

        "echo" => Ok(br_to_exec(handle_echo(state, args))),
        "printf" => Ok(br_to_exec(handle_printf(state, args))),

        "type" => Ok(br_to_exec(handle_type_builtin(state, args))),

        "[" | "test" => {
            let mut test_args = args.to_vec();
            if command_name == "[" {
                if test_args.last().map(|s| s.as_str()) != Some("]") {
                    return Some(Ok(ExecResult::failure("bash: [: missing `]'\n")));
                }
                test_args.pop();
            }
            Ok(br_to_exec(handle_test(state, &test_args)))
        }

        _ => return None,
    };

    Some(result)
}

/// `type name...` — describe whether `name` is an alias, function, builtin,
/// or external command found on `$PATH`.
fn handle_type_builtin(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    use crate::interpreter::command_resolution::resolve_command;
    let mut stdout = String::new();
    let mut exit_code = 0;
    for name in args {
        if let Some(alias) = state.aliases.as_ref().and_then(|a| a.get(name)) {
            stdout.push_str(&format!("{} is aliased to `{}'\n", name, alias));
        } else if state.functions.contains_key(name) {
            stdout.push_str(&format!("{} is a function\n", name));
        } else if SHELL_BUILTINS.contains(name.as_str()) {
            stdout.push_str(&format!("{} is a shell builtin\n", name));
        } else if let Some(path) = resolve_command(state, name) {
            stdout.push_str(&format!("{} is {}\n", name, path));
        } else {
            stdout.push_str(&format!("bash: type: {}: not found\n", name));
            exit_code = 1;
        }
    }
    BuiltinResult { stdout, stderr: String::new(), exit_code }
}
