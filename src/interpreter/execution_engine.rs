//! Execution Engine
//!
//! The core execution engine that ties all interpreter components together.
//! Implements the full AST execution chain:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command

use std::collections::HashMap;
use std::io::Write as _;
use std::process::Stdio;

use crate::ast::types::{
    CaseTerminator, CommandNode, CompoundCommandNode, PipelineNode, RedirectionNode,
    RedirectionOperator, RedirectionTarget, ScriptNode, SimpleCommandNode, StatementNode,
    StatementOperator,
};
use crate::interpreter::alias_expansion::{
    expand_alias, AliasExpansionContext, AliasExpansionResult,
};
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::builtin_dispatch::dispatch_builtin;
use crate::interpreter::command_resolution::resolve_command;
use crate::interpreter::control_flow::{execute_for, execute_if, execute_until, execute_while, ForResult};
use crate::interpreter::errors::{
    ControlFlowError, ErrexitError, ExecutionLimitError, InterpreterError, LimitType,
};
use crate::interpreter::functions::{call_function, execute_function_def};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::interpreter::{
    build_exported_env, check_command_limit, should_trigger_errexit, update_exit_code,
    ExecuteScriptFn,
};
use crate::interpreter::pipeline_execution::{execute_pipeline, PipelineOptions, PipelineState, set_pipestatus};
use crate::interpreter::redirections::{
    apply_redirections, pre_expand_redirect_targets, process_fd_variable_redirections,
    read_redirect_source,
};
use crate::interpreter::simple_command_assignments::process_assignments;
use crate::interpreter::subshell_group::{execute_group, execute_subshell};
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterContext, InterpreterState};
use crate::interpreter::word_expansion::{expand_argument_words, expand_word_no_glob};

/// The execution engine that ties all interpreter components together.
///
/// Owns its `ExecutionLimits` by value (rather than borrowing) so that
/// `make_exec_script_fn` can hand out a `'static` closure that builds a
/// fresh engine per re-entry (command substitution, `$(...)`, `[[ ]]`).
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    /// Execution limits (max commands, recursion depth, iterations)
    pub limits: ExecutionLimits,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new(limits: ExecutionLimits) -> Self {
        Self { limits }
    }

    /// Build a callback usable as `ExecuteScriptFn` for re-entering the
    /// interpreter from word expansion or conditional evaluation. Clones
    /// `limits` into the closure so it stays `'static`.
    pub fn make_exec_script_fn(&self) -> ExecuteScriptFn {
        let limits = self.limits.clone();
        Box::new(move |ast: &ScriptNode, state: &mut InterpreterState| {
            let engine = ExecutionEngine::new(limits.clone());
            match engine.execute_script(state, ast) {
                Ok(result) => result,
                Err(InterpreterError::Exit(e)) => ExecResult::new(e.stdout, e.stderr, e.exit_code),
                Err(InterpreterError::Errexit(e)) => ExecResult::new(e.stdout, e.stderr, e.exit_code),
                Err(InterpreterError::Return(e)) => ExecResult::new(e.stdout, e.stderr, e.exit_code),
                Err(InterpreterError::Break(e)) => ExecResult::new(e.stdout, e.stderr, 0),
                Err(InterpreterError::Continue(e)) => ExecResult::new(e.stdout, e.stderr, 0),
                Err(e) => ExecResult::new(String::new(), format!("bash: {}\n", e), 1),
            }
        })
    }

    /// Execute a complete script (list of statements).
    pub fn execute_script(
        &self,
        state: &mut InterpreterState,
        ast: &ScriptNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for statement in &ast.statements {
            match self.execute_statement(state, statement) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                    update_exit_code(state, exit_code);
                }
                Err(InterpreterError::Exit(e)) => {
                    // ExitError propagates up to terminate the script
                    let mut err = e;
                    err.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Exit(err));
                }
                Err(InterpreterError::ExecutionLimit(e)) => {
                    // ExecutionLimitError must always propagate
                    return Err(InterpreterError::ExecutionLimit(e));
                }
                Err(InterpreterError::Errexit(e)) => {
                    // Errexit terminates the script
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    exit_code = e.exit_code;
                    return Ok(ExecResult::new(stdout, stderr, exit_code));
                }
                Err(InterpreterError::Break(mut e)) => {
                    // Break/continue outside loops - silently continue
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Return(mut e)) => {
                    // Return outside function - propagate
                    e.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Return(e));
                }
                Err(e) => {
                    // Other errors - convert to result
                    stderr.push_str(&format!("{}\n", e));
                    exit_code = 1;
                }
            }
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a single statement (list of pipelines with && || operators).
    pub fn execute_statement(
        &self,
        state: &mut InterpreterState,
        stmt: &StatementNode,
    ) -> Result<ExecResult, InterpreterError> {
        // Handle deferred syntax errors
        if let Some(ref err) = stmt.deferred_error {
            return Ok(ExecResult::new(
                String::new(),
                format!("bash: syntax error near unexpected token `{}'\n", err.token),
                2,
            ));
        }

        // noexec mode (set -n): parse but don't execute
        if state.options.noexec {
            return Ok(ExecResult::ok());
        }

        // Reset errexit_safe at start of each statement
        state.errexit_safe = Some(false);

        let mut stdout = String::new();
        let mut stderr = String::new();

        // verbose mode (set -v): print source before execution
        if state.options.verbose {
            if let Some(ref source) = stmt.source_text {
                stderr.push_str(source);
                stderr.push('\n');
            }
        }

        let mut exit_code = 0;
        let mut last_executed_index: i32 = -1;
        let mut last_pipeline_negated = false;

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            // Check && / || short-circuit
            if i > 0 {
                let op = &stmt.operators[i - 1];
                match op {
                    StatementOperator::And => {
                        if exit_code != 0 {
                            continue;
                        }
                    }
                    StatementOperator::Or => {
                        if exit_code == 0 {
                            continue;
                        }
                    }
                    StatementOperator::Semi => {
                        // Always execute
                    }
                }
            }

            let result = self.execute_pipeline_node(state, pipeline)?;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;
            last_executed_index = i as i32;
            last_pipeline_negated = pipeline.negated;

            update_exit_code(state, exit_code);
        }

        // Check errexit
        let was_short_circuited = last_executed_index < (stmt.pipelines.len() as i32 - 1);
        let inner_was_safe = state.errexit_safe.unwrap_or(false);

        if should_trigger_errexit(state, exit_code, was_short_circuited, last_pipeline_negated)
            && !inner_was_safe
        {
            return Err(InterpreterError::Errexit(ErrexitError::new(
                exit_code, stdout, stderr,
            )));
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a pipeline (list of commands connected by |).
    pub fn execute_pipeline_node(
        &self,
        state: &mut InterpreterState,
        pipeline: &PipelineNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut pipe_state = PipelineState::new();
        let pipe_stderr = pipeline.pipe_stderr.clone().unwrap_or_default();

        let options = PipelineOptions {
            pipefail: state.options.pipefail,
            lastpipe: state.shopt_options.lastpipe,
            runs_in_subshell: false,
            time_pipeline: pipeline.timed,
            time_posix_format: pipeline.time_posix,
        };

        // We need to pass state through the closure, but execute_pipeline
        // takes ownership of the closure. Use a RefCell pattern.
        use std::cell::RefCell;
        let state_cell = RefCell::new(state);

        let result = execute_pipeline(
            &mut pipe_state,
            &pipeline.commands,
            &pipe_stderr,
            &options,
            |cmd, stdin| {
                let state = &mut *state_cell.borrow_mut();
                self.execute_command(state, cmd, stdin)
            },
        )?;

        // Get state back
        let state = state_cell.into_inner();

        // Set PIPESTATUS
        set_pipestatus(&mut state.env, &result.exit_codes);

        let mut exec_result = result.to_exec_result();

        // Handle negation
        if pipeline.negated {
            exec_result.exit_code = if exec_result.exit_code == 0 { 1 } else { 0 };
        }

        Ok(exec_result)
    }

    /// Execute a single command.
    pub fn execute_command(
        &self,
        state: &mut InterpreterState,
        cmd: &CommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Check command limit
        if let Some(msg) = check_command_limit(state, &self.limits) {
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                msg,
                LimitType::Commands,
            )));
        }

        match cmd {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple, stdin),
            CommandNode::Compound(compound) => {
                self.execute_compound_command(state, compound, stdin)
            }
            CommandNode::FunctionDef(func_def) => {
                let current_source = state.current_source.clone();
                execute_function_def(state, func_def, current_source.as_deref())
                    .map_err(InterpreterError::Exit)
            }
        }
    }

    /// Resolve the stdin a simple command should receive from its own
    /// redirections: `<`, `<>`, `<<<` (here-string) and here-documents, in
    /// the order they appear (the last one wins, matching bash).
    fn resolve_stdin(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        exec_script: &ExecuteScriptFn,
    ) -> Result<Option<String>, String> {
        let mut stdin = None;
        for redir in redirections {
            match &redir.target {
                RedirectionTarget::HereDoc(doc) => {
                    let mut body = expand_word_no_glob(state, &doc.content, exec_script).value;
                    if doc.strip_tabs {
                        body = body
                            .split('\n')
                            .map(|line| line.trim_start_matches('\t'))
                            .collect::<Vec<_>>()
                            .join("\n");
                    }
                    stdin = Some(body);
                }
                RedirectionTarget::Word(word) => match redir.operator {
                    RedirectionOperator::Less | RedirectionOperator::LessGreat => {
                        let target = expand_word_no_glob(state, word, exec_script).value;
                        stdin = Some(read_redirect_source(state, &target)?);
                    }
                    RedirectionOperator::TLess => {
                        let target = expand_word_no_glob(state, word, exec_script).value;
                        stdin = Some(format!("{}\n", target));
                    }
                    _ => {}
                },
            }
        }
        Ok(stdin)
    }

    /// Execute a simple command (name + args + redirections).
    pub fn execute_simple_command(
        &self,
        state: &mut InterpreterState,
        cmd: &SimpleCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Set line number for $LINENO
        if let Some(line) = cmd.line {
            state.current_line = line as u32;
        }

        let exec_script = self.make_exec_script_fn();
        let expand_word_fn = |s: &mut InterpreterState, w: &crate::ast::types::WordNode| {
            expand_word_no_glob(s, w, &exec_script).value
        };

        // Alias expansion only applies to the outermost word of the command,
        // and only when the shopt is enabled.
        let cmd = if state.shopt_options.expand_aliases && cmd.name.is_some() {
            let aliases = state.aliases.clone().unwrap_or_default();
            let ctx = AliasExpansionContext { aliases: &aliases };
            let mut stack = std::collections::HashSet::new();
            match expand_alias(&ctx, cmd, &mut stack) {
                AliasExpansionResult::NoExpansion => cmd.clone(),
                AliasExpansionResult::Expanded(expanded) => expanded,
                AliasExpansionResult::ComplexAlias(source) => {
                    let ast = match crate::parser::Parser::new().parse(&source) {
                        Ok(ast) => ast,
                        Err(e) => {
                            return Ok(ExecResult::new(
                                String::new(),
                                format!("bash: {}\n", e),
                                127,
                            ));
                        }
                    };
                    return self.execute_script(state, &ast);
                }
                AliasExpansionResult::ParseError(e) => {
                    return Ok(ExecResult::new(String::new(), format!("bash: {}\n", e), 127));
                }
            }
        } else {
            cmd.clone()
        };

        // Assignments: `VAR=val cmd` (temporary) or `VAR=val` alone (permanent).
        let assignment_result = process_assignments(state, &cmd, &expand_word_fn);
        if let Some(err_result) = assignment_result.error {
            return Ok(err_result);
        }

        let mut xtrace = assignment_result.xtrace_output;

        let cmd_name = match &cmd.name {
            Some(word) => expand_word_no_glob(state, word, &exec_script).value,
            None => {
                // Assignment-only command; nothing left to run.
                return Ok(ExecResult::new(xtrace, String::new(), 0));
            }
        };

        // Expand arguments (brace/IFS-split/glob).
        let mut args: Vec<String> = Vec::new();
        let mut expand_stderr = String::new();
        for arg in &cmd.args {
            let result = expand_argument_words(state, arg, &exec_script);
            args.extend(result.words);
            expand_stderr.push_str(&result.stderr);
        }

        // Pre-expand redirect targets and wire up FD-variable redirections
        // before dispatch, so side effects in the targets happen up front.
        let pre_expand = pre_expand_redirect_targets(state, &cmd.redirections, &expand_word_fn);
        if let Some(result) = process_fd_variable_redirections(state, &cmd.redirections, &expand_word_fn) {
            return Ok(result);
        }

        let resolved_stdin = match self.resolve_stdin(state, &cmd.redirections, &exec_script) {
            Ok(s) => s.unwrap_or_else(|| stdin.to_string()),
            Err(e) => return Ok(ExecResult::new(String::new(), e, 1)),
        };

        let result = if let Some(dispatch_result) =
            dispatch_builtin(state, &cmd_name, &args, &resolved_stdin, 0)
        {
            dispatch_result?
        } else if let Some(func) = state.functions.get(&cmd_name).cloned() {
            call_function(
                state,
                &func,
                &args,
                &resolved_stdin,
                cmd.line.map(|l| l as u32),
                self.limits.max_recursion_depth,
                |state, stdin| self.execute_compound_command(state, &func.body, stdin),
            )?
        } else if let Some(path) = resolve_command(state, &cmd_name) {
            self.execute_external_command(state, &path, &args, &resolved_stdin)
        } else if state.shopt_options.autocd && args.is_empty() && std::path::Path::new(&cmd_name).is_dir() {
            dispatch_builtin(state, "cd", &[cmd_name.clone()], "", 0)
                .expect("cd is always a builtin")?
        } else {
            ExecResult::new(
                String::new(),
                format!("bash: {}: command not found\n", cmd_name),
                127,
            )
        };

        // Restore temporary (prefix) assignments once the command has run.
        for (name, old_value) in assignment_result.temp_assignments {
            match old_value {
                Some(v) => {
                    state.env.insert(name, v);
                }
                None => {
                    state.env.remove(&name);
                }
            }
        }

        xtrace.push_str(&expand_stderr);
        let mut result = result;
        result.stdout = format!("{}{}", xtrace, result.stdout);

        Ok(apply_redirections(
            state,
            result,
            &cmd.redirections,
            Some(&pre_expand.targets),
            &expand_word_fn,
        ))
    }

    /// Run an external command as a real OS child process, passing only the
    /// exported part of the shell's environment.
    fn execute_external_command(
        &self,
        state: &mut InterpreterState,
        path: &str,
        args: &[String],
        stdin: &str,
    ) -> ExecResult {
        let env: HashMap<String, String> = build_exported_env(state);

        let mut command = std::process::Command::new(path);
        command
            .args(args)
            .current_dir(&state.cwd)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecResult::new(
                    String::new(),
                    format!("bash: {}: {}\n", path, e),
                    126,
                );
            }
        };

        if let Some(mut child_stdin) = child.stdin.take() {
            let _ = child_stdin.write_all(stdin.as_bytes());
        }

        match child.wait_with_output() {
            Ok(output) => ExecResult::new(
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
                output.status.code().unwrap_or(128),
            ),
            Err(e) => ExecResult::new(String::new(), format!("bash: {}: {}\n", path, e), 126),
        }
    }

    /// Execute a compound command (if, for, while, etc.).
    pub fn execute_compound_command(
        &self,
        state: &mut InterpreterState,
        compound: &CompoundCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        match compound {
            CompoundCommandNode::If(if_node) => {
                // Build clauses for execute_if
                let clauses: Vec<(Vec<&StatementNode>, Vec<&StatementNode>)> = if_node
                    .clauses
                    .iter()
                    .map(|c| {
                        (
                            c.condition.iter().collect(),
                            c.body.iter().collect(),
                        )
                    })
                    .collect();

                let else_body: Option<Vec<&StatementNode>> =
                    if_node.else_body.as_ref().map(|b| b.iter().collect());

                let result = execute_if(
                    state,
                    &clauses,
                    else_body.as_deref(),
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::For(for_node) => {
                let exec_script = self.make_exec_script_fn();

                // Expand words
                let mut words: Vec<String> = Vec::new();
                if let Some(ref word_list) = for_node.words {
                    for word in word_list {
                        let result = expand_argument_words(state, word, &exec_script);
                        words.extend(result.words);
                    }
                } else {
                    // Default to positional parameters
                    let argc: usize = state.env.get("#")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    for i in 1..=argc {
                        if let Some(val) = state.env.get(&i.to_string()) {
                            words.push(val.clone());
                        }
                    }
                }

                let body: Vec<&StatementNode> = for_node.body.iter().collect();

                let result = execute_for(
                    state,
                    &for_node.variable,
                    &words,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::While(while_node) => {
                let condition: Vec<&StatementNode> = while_node.condition.iter().collect();
                let body: Vec<&StatementNode> = while_node.body.iter().collect();

                let result = execute_while(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Until(until_node) => {
                let condition: Vec<&StatementNode> = until_node.condition.iter().collect();
                let body: Vec<&StatementNode> = until_node.body.iter().collect();

                let result = execute_until(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Case(case_node) => {
                let exec_script = self.make_exec_script_fn();
                let subject = expand_word_no_glob(state, &case_node.word, &exec_script).value;
                let nocasematch = state.shopt_options.nocasematch;
                let extglob = state.shopt_options.extglob;

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let mut fallthrough = false;

                let mut idx = 0;
                while idx < case_node.items.len() {
                    let item = &case_node.items[idx];

                    let matched = fallthrough
                        || item.patterns.iter().any(|pat| {
                            let pattern = expand_word_no_glob(state, pat, &exec_script).value;
                            crate::interpreter::conditionals::match_pattern(
                                &subject, &pattern, nocasematch, extglob,
                            )
                        });

                    if matched {
                        for stmt in &item.body {
                            let result = self.execute_statement(state, stmt)?;
                            stdout.push_str(&result.stdout);
                            stderr.push_str(&result.stderr);
                            exit_code = result.exit_code;
                        }

                        match item.terminator {
                            CaseTerminator::DoubleSemi => break,
                            CaseTerminator::SemiAnd => {
                                fallthrough = true;
                                idx += 1;
                                continue;
                            }
                            CaseTerminator::SemiSemiAnd => {
                                fallthrough = false;
                                idx += 1;
                                continue;
                            }
                        }
                    }

                    idx += 1;
                }

                Ok(ExecResult::new(stdout, stderr, exit_code))
            }

            CompoundCommandNode::Subshell(subshell_node) => {
                execute_subshell(
                    state,
                    &subshell_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::Group(group_node) => {
                execute_group(
                    state,
                    &group_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::ArithmeticCommand(arith) => {
                let mut ctx = InterpreterContext::new(state, &self.limits);
                match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                    Ok(value) => {
                        // Arithmetic command: exit 0 if non-zero, exit 1 if zero
                        let exit_code = if value != 0 { 0 } else { 1 };
                        Ok(ExecResult::new(String::new(), String::new(), exit_code))
                    }
                    Err(e) => {
                        Ok(ExecResult::new(
                            String::new(),
                            format!("bash: {}\n", e),
                            1,
                        ))
                    }
                }
            }

            CompoundCommandNode::ConditionalCommand(cond) => {
                let exec_script = self.make_exec_script_fn();
                let (result, stderr) = crate::interpreter::conditional_eval::evaluate_conditional(
                    state,
                    &cond.expression,
                    &exec_script,
                );
                Ok(ExecResult::new(
                    String::new(),
                    stderr,
                    if result { 0 } else { 1 },
                ))
            }

            CompoundCommandNode::CStyleFor(cfor) => {
                let mut ctx = InterpreterContext::new(state, &self.limits);
                if let Some(ref init) = cfor.init {
                    if let Err(e) = evaluate_arithmetic(&mut ctx, &init.expression, false, None) {
                        return Ok(ExecResult::new(String::new(), format!("bash: {}\n", e), 1));
                    }
                }

                let mut acc = ForResult::default();
                state.loop_depth += 1;
                let mut iterations: u64 = 0;

                let outcome: Result<(), InterpreterError> = loop {
                    if let Some(ref cond) = cfor.condition {
                        let mut ctx = InterpreterContext::new(state, &self.limits);
                        match evaluate_arithmetic(&mut ctx, &cond.expression, false, None) {
                            Ok(0) => break Ok(()),
                            Ok(_) => {}
                            Err(e) => {
                                acc.stderr.push_str(&format!("bash: {}\n", e));
                                acc.exit_code = 1;
                                break Ok(());
                            }
                        }
                    }

                    iterations += 1;
                    if iterations > self.limits.max_iterations {
                        break Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                            format!("too many loop iterations (>{})", self.limits.max_iterations),
                            LimitType::Iterations,
                        )));
                    }

                    let mut do_break = false;
                    let mut propagate = None;
                    for stmt in &cfor.body {
                        match self.execute_statement(state, stmt) {
                            Ok(res) => {
                                acc.stdout.push_str(&res.stdout);
                                acc.stderr.push_str(&res.stderr);
                                acc.exit_code = res.exit_code;
                            }
                            Err(InterpreterError::Break(mut e)) => {
                                e.prepend_output(&acc.stdout, &acc.stderr);
                                acc.stdout = e.stdout.clone();
                                acc.stderr = e.stderr.clone();
                                if e.levels > 1 {
                                    e.levels -= 1;
                                    propagate = Some(InterpreterError::Break(e));
                                } else {
                                    do_break = true;
                                }
                                break;
                            }
                            Err(InterpreterError::Continue(mut e)) => {
                                e.prepend_output(&acc.stdout, &acc.stderr);
                                acc.stdout = e.stdout.clone();
                                acc.stderr = e.stderr.clone();
                                if e.levels > 1 {
                                    e.levels -= 1;
                                    propagate = Some(InterpreterError::Continue(e));
                                }
                                // levels == 1: continue this loop - just stop running
                                // the rest of the body and fall through to `update`.
                                break;
                            }
                            Err(e) => {
                                propagate = Some(e);
                                break;
                            }
                        }
                    }
                    if let Some(e) = propagate {
                        break Err(e);
                    }
                    if do_break {
                        break Ok(());
                    }

                    if let Some(ref update) = cfor.update {
                        let mut ctx = InterpreterContext::new(state, &self.limits);
                        if let Err(e) = evaluate_arithmetic(&mut ctx, &update.expression, false, None) {
                            acc.stderr.push_str(&format!("bash: {}\n", e));
                            acc.exit_code = 1;
                            break Ok(());
                        }
                    }
                };

                state.loop_depth -= 1;
                outcome?;

                Ok(ExecResult::new(acc.stdout, acc.stderr, acc.exit_code))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_engine_and_state() -> (ExecutionEngine, InterpreterState) {
        let engine = ExecutionEngine::new(ExecutionLimits::default());
        let state = InterpreterState::default();
        (engine, state)
    }

    #[test]
    fn test_execute_echo() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("echo hello world").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.stdout, "hello world\n");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_execute_variable_expansion() {
        let (engine, mut state) = make_engine_and_state();
        state.env.insert("NAME".to_string(), "world".to_string());

        let ast = crate::parser::parse("echo hello $NAME").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.stdout, "hello world\n");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_execute_true_false() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("true").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.exit_code, 0);

        let ast = crate::parser::parse("false").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_execute_and_or() {
        let (engine, mut state) = make_engine_and_state();

        // true && echo yes
        let ast = crate::parser::parse("true && echo yes").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "yes\n");

        // false && echo no (should not print)
        let ast = crate::parser::parse("false && echo no").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "");

        // false || echo fallback
        let ast = crate::parser::parse("false || echo fallback").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "fallback\n");
    }

    #[test]
    fn test_execute_if() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("if true; then echo yes; fi").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "yes\n");

        let ast = crate::parser::parse("if false; then echo no; else echo else; fi").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "else\n");
    }

    #[test]
    fn test_execute_for() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("for i in a b c; do echo $i; done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "a\nb\nc\n");
    }

    #[test]
    fn test_execute_c_style_for() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("for ((i=0; i<3; i++)); do echo $i; done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "0\n1\n2\n");
    }

    #[test]
    fn test_execute_while() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("while false; do echo loop; done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_execute_while_counts_down() {
        let (engine, mut state) = make_engine_and_state();
        state.env.insert("x".to_string(), "3".to_string());

        let ast = crate::parser::parse("while [ $x -gt 0 ]; do echo $x; x=$((x - 1)); done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "3\n2\n1\n");
    }

    #[test]
    fn test_execute_subshell_does_not_leak_assignments() {
        let (engine, mut state) = make_engine_and_state();
        state.env.insert("X".to_string(), "original".to_string());

        let ast = crate::parser::parse("(X=modified; echo $X); echo $X").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "modified\noriginal\n");
    }

    #[test]
    fn test_execute_group() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("{ echo a; echo b; }").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[test]
    fn test_execute_pwd_cd() {
        let dir = std::env::temp_dir();
        let engine = ExecutionEngine::new(ExecutionLimits::default());
        let mut state = InterpreterState::default();
        state.cwd = dir.to_string_lossy().into_owned();
        state.env.insert("PWD".to_string(), state.cwd.clone());

        let ast = crate::parser::parse("pwd").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, format!("{}\n", state.cwd));
    }

    #[test]
    fn test_execute_case_fallthrough() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("case a in a) echo one;& b) echo two;; esac").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "one\ntwo\n");
    }

    #[test]
    fn test_execute_conditional_command() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("[[ -n foo ]] && echo yes").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "yes\n");
    }

    #[test]
    fn test_execute_external_command() {
        let (engine, mut state) = make_engine_and_state();

        let ast = crate::parser::parse("/bin/echo hi").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "hi\n");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_command_not_found() {
        let (engine, mut state) = make_engine_and_state();
        state.env.insert("PATH".to_string(), "/nonexistent".to_string());

        let ast = crate::parser::parse("totallymadeupcommand").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.exit_code, 127);
        assert!(result.stderr.contains("command not found"));
    }
}
