//! `Shell`: ties `InterpreterState`, `ExecutionEngine`, `Config`, and the
//! line editor together into the entry point `den`'s binary drives
//! (SPEC_FULL.md §6). One-shot execution (`-c`, a script file, `-s`) and
//! the interactive read-eval-print loop both go through here so both
//! startup paths apply the same config/env/option setup.

use std::io::{IsTerminal, Write};

use tracing::info_span;

use crate::config::Config;
use crate::executor::signals::SignalFlags;
use crate::interpreter::builtins::set_cmd::handle_set;
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterState};
use crate::interpreter::ExecutionEngine as Engine;
use crate::line_editor::{CompletionEngine, DefaultPromptRenderer, DirScanCompletion, LineEditor, PromptRenderer, ReadLineOutcome};
use crate::parser::{self, ParseException};

/// Exit code for a parse error, per SPEC_FULL.md §6/§7.
const SYNTAX_ERROR_EXIT: i32 = 2;

pub struct Shell {
    pub state: InterpreterState,
    pub config: Config,
    engine: Engine,
    editor: LineEditor,
    prompt_renderer: Box<dyn PromptRenderer>,
    completion: Box<dyn CompletionEngine>,
    signals: Option<SignalFlags>,
}

impl Shell {
    /// Build a shell with process environment inherited into `state.env`,
    /// `PWD`/`cwd` set from the real working directory, and config loaded
    /// from the fixed search path (SPEC_FULL.md §6 startup-file ordering).
    pub fn new() -> Self {
        let mut state = InterpreterState::default();
        for (key, value) in std::env::vars() {
            state.env.insert(key, value);
        }
        if let Ok(cwd) = std::env::current_dir() {
            state.cwd = cwd.to_string_lossy().into_owned();
            state.env.insert("PWD".to_string(), state.cwd.clone());
        }
        state.env.entry("PATH".to_string()).or_insert_with(|| "/usr/bin:/bin".to_string());

        let config = Config::load();
        state.history.max_size = config.history_size;
        if !config.aliases.is_empty() {
            state.aliases.get_or_insert_with(Default::default).extend(config.aliases.clone());
        }
        for (key, value) in &config.env {
            state.env.insert(key.clone(), value.clone());
        }
        if let Some(path) = config.history_file.as_ref().map(|p| shellexpand_home(p)) {
            let _ = state.history.load_from_file(std::path::Path::new(&path));
        }

        Self {
            state,
            config,
            engine: Engine::new(ExecutionLimits::default()),
            editor: LineEditor::new(),
            prompt_renderer: Box::new(DefaultPromptRenderer),
            completion: Box::new(DirScanCompletion::default()),
            signals: SignalFlags::install().ok(),
        }
    }

    /// Apply `set`-style flags collected from argv (`-e -u -x -o NAME
    /// +o NAME -n`, in the order they were given) before running anything.
    pub fn apply_startup_set_flags(&mut self, flags: &[String]) {
        if flags.is_empty() {
            return;
        }
        match handle_set(&mut self.state, flags) {
            Ok(result) => {
                if !result.stderr.is_empty() {
                    eprint!("{}", result.stderr);
                }
            }
            Err(e) => eprintln!("den: {}", e),
        }
    }

    /// Parse and run one script, writing its stdout/stderr and returning
    /// its exit code. Used by `-c`, file execution, and `-s`.
    pub fn run_script(&mut self, source: &str) -> i32 {
        let ast = match parser::parse(source) {
            Ok(ast) => ast,
            Err(e) => return self.report_parse_error(e),
        };

        let span = info_span!("shell.cmd", source_len = source.len());
        let _enter = span.enter();

        let result = self.engine.execute_script(&mut self.state, &ast);
        self.emit(result.unwrap_or_else(|e| ExecResult::new(String::new(), format!("den: {}\n", e), 1)))
    }

    /// Run the interactive read-eval-print loop until EOF (`Ctrl-D`) or the
    /// `exit` builtin, returning the final exit status.
    pub fn run_interactive(&mut self) -> i32 {
        let mut last_status = 0;
        loop {
            if let Some(flags) = &self.signals {
                if flags.take_sigchld() {
                    self.reap_jobs();
                }
            }

            let key_bindings = self.config.key_bindings.clone();
            let prompt_format = self.config.prompt.clone();
            let outcome = self.editor.read_line(
                &self.state,
                &self.state.history,
                &prompt_format,
                self.prompt_renderer.as_ref(),
                self.completion.as_ref(),
                &key_bindings,
            );

            match outcome {
                Ok(ReadLineOutcome::Accepted(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.state.history.push(line.clone());
                    last_status = self.run_script(&line);
                }
                Ok(ReadLineOutcome::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Ok(ReadLineOutcome::Eof) => break,
                Err(e) => {
                    eprintln!("den: terminal I/O error: {}", e);
                    break;
                }
            }
        }

        if let Some(path) = self.config.history_file.as_ref().map(|p| shellexpand_home(p)) {
            let _ = self.state.history.write_to_file(std::path::Path::new(&path));
        }

        last_status
    }

    /// Whether this process should run interactively by default (stdin is
    /// a terminal), absent an explicit `-c`/file/`-s` source.
    pub fn stdin_is_terminal() -> bool {
        std::io::stdin().is_terminal()
    }

    fn reap_jobs(&mut self) {
        use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
        use nix::unistd::Pid;

        loop {
            match waitpid(Option::<Pid>::None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, code)) => self.mark_job_done(pid.as_raw(), code),
                Ok(WaitStatus::Signaled(pid, sig, _)) => self.mark_job_done(pid.as_raw(), 128 + sig as i32),
                _ => break,
            }
        }
    }

    fn mark_job_done(&mut self, pid: i32, status: i32) {
        if let Some(job) = self.state.jobs.find_by_pgid_mut(pid) {
            job.state = crate::interpreter::jobs::JobState::Done;
            job.last_status = Some(status);
        }
    }

    fn report_parse_error(&mut self, e: ParseException) -> i32 {
        eprintln!("den: {}", e);
        SYNTAX_ERROR_EXIT
    }

    fn emit(&mut self, result: ExecResult) -> i32 {
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
            let _ = std::io::stdout().flush();
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
        result.exit_code
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

fn shellexpand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_script_reports_syntax_errors_as_exit_2() {
        let mut shell = Shell::new();
        let status = shell.run_script("if then");
        assert_eq!(status, SYNTAX_ERROR_EXIT);
    }

    #[test]
    fn run_script_executes_simple_command() {
        let mut shell = Shell::new();
        let status = shell.run_script("true");
        assert_eq!(status, 0);
    }

    #[test]
    fn apply_startup_set_flags_enables_errexit() {
        let mut shell = Shell::new();
        shell.apply_startup_set_flags(&["-e".to_string()]);
        assert!(shell.state.options.errexit);
    }
}
