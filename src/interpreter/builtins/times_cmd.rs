//! times - report accumulated user/system CPU time for the shell and its children.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_times(_state: &InterpreterState, _args: &[String]) -> BuiltinResult {
    let (user, system) = self_cpu_times();
    let (cuser, csystem) = children_cpu_times();
    let stdout = format!(
        "{} {}\n{} {}\n",
        format_time(user), format_time(system), format_time(cuser), format_time(csystem)
    );
    BuiltinResult { stdout, stderr: String::new(), exit_code: 0 }
}

fn format_time(seconds: f64) -> String {
    format!("{}m{:.3}s", (seconds / 60.0) as u64, seconds % 60.0)
}

#[cfg(unix)]
fn self_cpu_times() -> (f64, f64) {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return (0.0, 0.0);
    }
    let to_secs = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    (to_secs(usage.ru_utime), to_secs(usage.ru_stime))
}

#[cfg(not(unix))]
fn self_cpu_times() -> (f64, f64) {
    (0.0, 0.0)
}

#[cfg(unix)]
fn children_cpu_times() -> (f64, f64) {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, &mut usage) };
    if ret != 0 {
        return (0.0, 0.0);
    }
    let to_secs = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    (to_secs(usage.ru_utime), to_secs(usage.ru_stime))
}

#[cfg(not(unix))]
fn children_cpu_times() -> (f64, f64) {
    (0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_two_lines() {
        let state = InterpreterState::default();
        let r = handle_times(&state, &[]);
        assert_eq!(r.stdout.lines().count(), 2);
    }
}
