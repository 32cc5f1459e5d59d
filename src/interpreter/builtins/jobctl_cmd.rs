//! jobs / fg / bg / wait / kill / disown - job control builtins.
//!
//! Grounded on `interpreter::jobs::JobTable` (pgid-based job tracking) and
//! delivers real signals via `nix::sys::signal::killpg`/`kill`, matching the
//! process-group model described there.

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::jobs::{resolve_job_spec, JobState};
use crate::interpreter::types::InterpreterState;

fn job_line(id: u32, job: &crate::interpreter::jobs::Job, marker: &str) -> String {
    format!("[{}]{}  {}                 {}\n", id, marker, job.state.as_str(), job.command_text)
}

pub fn handle_jobs(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    reap_finished(state);
    let show_pids_only = args.iter().any(|a| a == "-p");
    let mut stdout = String::new();
    let current = state.jobs.current().map(|j| j.id);
    for job in state.jobs.iter() {
        if show_pids_only {
            stdout.push_str(&format!("{}\n", job.pgid));
        } else {
            let marker = if Some(job.id) == current { "+" } else { "-" };
            stdout.push_str(&job_line(job.id, job, marker));
        }
    }
    BuiltinResult { stdout, stderr: String::new(), exit_code: 0 }
}

/// Poll all tracked jobs for state changes without blocking.
fn reap_finished(state: &mut InterpreterState) {
    let pgids: Vec<i32> = state.jobs.iter().map(|j| j.pgid).collect();
    for pgid in pgids {
        if let Some(job) = state.jobs.find_by_pgid_mut(pgid) {
            for &pid in job.pids.clone().iter() {
                match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED)) {
                    Ok(WaitStatus::Exited(_, code)) => {
                        job.state = JobState::Done;
                        job.last_status = Some(code);
                    }
                    Ok(WaitStatus::Signaled(_, sig, _)) => {
                        job.state = JobState::Done;
                        job.last_status = Some(128 + sig as i32);
                    }
                    Ok(WaitStatus::Stopped(_, _)) => {
                        job.state = JobState::Stopped;
                    }
                    Ok(WaitStatus::Continued(_)) => {
                        job.state = JobState::Running;
                    }
                    _ => {}
                }
            }
        }
    }
}

pub fn handle_wait(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        let pgids: Vec<i32> = state.jobs.iter().filter(|j| j.state != JobState::Done).map(|j| j.pgid).collect();
        let mut last_status = 0;
        for pgid in pgids {
            if let Some(job) = state.jobs.find_by_pgid_mut(pgid) {
                for &pid in job.pids.clone().iter() {
                    if let Ok(WaitStatus::Exited(_, code)) = waitpid(Pid::from_raw(pid), None) {
                        last_status = code;
                    }
                }
                job.state = JobState::Done;
            }
        }
        state.jobs.reap_done();
        return BuiltinResult { stdout: String::new(), stderr: String::new(), exit_code: last_status };
    }

    let mut exit_code = 0;
    for spec in args {
        let Some(id) = resolve_job_spec(&state.jobs, spec) else {
            return BuiltinResult::failure(&format!("bash: wait: {}: no such job\n", spec), 127);
        };
        if let Some(job) = state.jobs.get(id).cloned() {
            for pid in job.pids {
                if let Ok(WaitStatus::Exited(_, code)) = waitpid(Pid::from_raw(pid), None) {
                    exit_code = code;
                }
            }
        }
        if let Some(job) = state.jobs.get_mut(id) {
            job.state = JobState::Done;
        }
    }
    state.jobs.reap_done();
    BuiltinResult { stdout: String::new(), stderr: String::new(), exit_code }
}

pub fn handle_kill(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let mut signal = Signal::SIGTERM;
    let mut targets = args;

    if let Some(name) = args.first().and_then(|f| f.strip_prefix('-')) {
        if let Ok(sig) = parse_signal(name) {
            signal = sig;
            targets = &args[1..];
        }
    }

    if targets.is_empty() {
        return BuiltinResult::failure("bash: kill: usage: kill [-s sigspec | -n signum | -sigspec] pid | jobspec ...\n", 2);
    }

    let mut stderr = String::new();
    let mut exit_code = 0;
    for target in targets {
        let result = if let Some(id) = target.strip_prefix('%') {
            resolve_job_spec(&state.jobs, &format!("%{}", id))
                .and_then(|jid| state.jobs.get(jid))
                .map(|job| signal::killpg(Pid::from_raw(job.pgid), signal))
        } else {
            target.parse::<i32>().ok().map(|pid| signal::kill(Pid::from_raw(pid), signal))
        };
        match result {
            Some(Ok(())) => {}
            Some(Err(e)) => { stderr.push_str(&format!("bash: kill: ({}) - {}\n", target, e)); exit_code = 1; }
            None => { stderr.push_str(&format!("bash: kill: {}: arguments must be process or job IDs\n", target)); exit_code = 1; }
        }
    }
    BuiltinResult { stdout: String::new(), stderr, exit_code }
}

fn parse_signal(name: &str) -> Result<Signal, ()> {
    let stripped = name.trim_start_matches('s').trim_start_matches('-');
    let upper = stripped.to_uppercase();
    let normalized = if upper.starts_with("SIG") { upper } else { format!("SIG{}", upper) };
    match normalized.as_str() {
        "SIGHUP" => Ok(Signal::SIGHUP),
        "SIGINT" => Ok(Signal::SIGINT),
        "SIGQUIT" => Ok(Signal::SIGQUIT),
        "SIGKILL" => Ok(Signal::SIGKILL),
        "SIGTERM" => Ok(Signal::SIGTERM),
        "SIGSTOP" => Ok(Signal::SIGSTOP),
        "SIGCONT" => Ok(Signal::SIGCONT),
        "SIGUSR1" => Ok(Signal::SIGUSR1),
        "SIGUSR2" => Ok(Signal::SIGUSR2),
        _ => stripped.parse::<i32>().ok().and_then(|n| Signal::try_from(n).ok()).ok_or(()),
    }
}

pub fn handle_disown(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        if let Some(id) = state.jobs.current().map(|j| j.id) {
            state.jobs.remove(id);
        }
        return BuiltinResult::ok();
    }
    for spec in args {
        if let Some(id) = resolve_job_spec(&state.jobs, spec) {
            state.jobs.remove(id);
        }
    }
    BuiltinResult::ok()
}

pub fn handle_fg(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let spec = args.first().map(|s| s.as_str()).unwrap_or("%%");
    let Some(id) = resolve_job_spec(&state.jobs, spec) else {
        return BuiltinResult::failure(&format!("bash: fg: {}: no such job\n", spec), 1);
    };
    let job = state.jobs.get(id).cloned().unwrap();
    let _ = signal::killpg(Pid::from_raw(job.pgid), Signal::SIGCONT);
    let mut last_status = 0;
    for pid in &job.pids {
        if let Ok(WaitStatus::Exited(_, code)) = waitpid(Pid::from_raw(*pid), Some(WaitPidFlag::WUNTRACED)) {
            last_status = code;
        }
    }
    if let Some(j) = state.jobs.get_mut(id) {
        j.state = JobState::Done;
    }
    state.jobs.reap_done();
    BuiltinResult { stdout: format!("{}\n", job.command_text), stderr: String::new(), exit_code: last_status }
}

pub fn handle_bg(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let spec = args.first().map(|s| s.as_str()).unwrap_or("%%");
    let Some(id) = resolve_job_spec(&state.jobs, spec) else {
        return BuiltinResult::failure(&format!("bash: bg: {}: no such job\n", spec), 1);
    };
    let job = state.jobs.get(id).cloned().unwrap();
    let _ = signal::killpg(Pid::from_raw(job.pgid), Signal::SIGCONT);
    if let Some(j) = state.jobs.get_mut(id) {
        j.state = JobState::Running;
    }
    BuiltinResult { stdout: format!("[{}]+ {} &\n", job.id, job.command_text), stderr: String::new(), exit_code: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_with_no_jobs_is_empty() {
        let mut state = InterpreterState::default();
        let r = handle_jobs(&mut state, &[]);
        assert_eq!(r.stdout, "");
    }

    #[test]
    fn fg_unknown_spec_reports_error() {
        let mut state = InterpreterState::default();
        let r = handle_fg(&mut state, &["%5".to_string()]);
        assert_eq!(r.exit_code, 1);
    }

    #[test]
    fn parse_signal_names() {
        assert_eq!(parse_signal("TERM"), Ok(Signal::SIGTERM));
        assert_eq!(parse_signal("9"), Ok(Signal::SIGKILL));
        assert_eq!(parse_signal("KILL"), Ok(Signal::SIGKILL));
    }
}
