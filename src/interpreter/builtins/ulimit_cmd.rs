//! ulimit - get and set shell resource limits

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

struct LimitSpec {
    flag: char,
    #[cfg(unix)]
    resource: libc::c_int,
    name: &'static str,
    /// Divisor applied to the raw rlimit value to get the unit ulimit reports in.
    unit: u64,
}

#[cfg(unix)]
const LIMITS: &[LimitSpec] = &[
    LimitSpec { flag: 'c', resource: libc::RLIMIT_CORE, name: "core file size", unit: 512 },
    LimitSpec { flag: 'd', resource: libc::RLIMIT_DATA, name: "data seg size", unit: 1024 },
    LimitSpec { flag: 'f', resource: libc::RLIMIT_FSIZE, name: "file size", unit: 512 },
    LimitSpec { flag: 'l', resource: libc::RLIMIT_MEMLOCK, name: "max locked memory", unit: 1024 },
    LimitSpec { flag: 'n', resource: libc::RLIMIT_NOFILE, name: "open files", unit: 1 },
    LimitSpec { flag: 's', resource: libc::RLIMIT_STACK, name: "stack size", unit: 1024 },
    LimitSpec { flag: 't', resource: libc::RLIMIT_CPU, name: "cpu time", unit: 1 },
    LimitSpec { flag: 'u', resource: libc::RLIMIT_NPROC, name: "max user processes", unit: 1 },
    LimitSpec { flag: 'v', resource: libc::RLIMIT_AS, name: "virtual memory", unit: 1024 },
];

#[cfg(not(unix))]
const LIMITS: &[LimitSpec] = &[];

fn find_limit(flag: char) -> Option<&'static LimitSpec> {
    LIMITS.iter().find(|l| l.flag == flag)
}

/// `ulimit [-HS] [-a] [-f|-n|-u|-t|-s|-c|-d|-v|-l] [limit]`
pub fn handle_ulimit(_state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let mut hard = false;
    let mut soft = false;
    let mut show_all = false;
    let mut flag = 'f';
    let mut new_value: Option<String> = None;
    let mut explicit_flag = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if let Some(rest) = arg.strip_prefix('-') {
            if rest.is_empty() {
                i += 1;
                continue;
            }
            for c in rest.chars() {
                match c {
                    'H' => hard = true,
                    'S' => soft = true,
                    'a' => show_all = true,
                    c if find_limit(c).is_some() => {
                        flag = c;
                        explicit_flag = true;
                    }
                    _ => {
                        return BuiltinResult::failure(&format!("bash: ulimit: -{}: invalid option\n", c), 2);
                    }
                }
            }
        } else {
            new_value = Some(arg.clone());
        }
        i += 1;
    }
    let _ = explicit_flag;

    if !hard && !soft {
        soft = true;
    }

    if show_all {
        return report_all();
    }

    let Some(spec) = find_limit(flag) else {
        return BuiltinResult::failure("bash: ulimit: resource limits not supported on this platform\n", 1);
    };

    match new_value {
        Some(v) => set_limit(spec, &v, hard, soft),
        None => get_limit(spec, hard),
    }
}

#[cfg(unix)]
fn report_all() -> BuiltinResult {
    let mut stdout = String::new();
    for spec in LIMITS {
        let mut lim: libc::rlimit = unsafe { std::mem::zeroed() };
        if unsafe { libc::getrlimit(spec.resource, &mut lim) } != 0 {
            continue;
        }
        stdout.push_str(&format!("{:<22} ({}-{}) {}\n", spec.name, format_flag(spec.flag), spec.unit, format_rlim(lim.rlim_cur, spec.unit)));
    }
    BuiltinResult { stdout, stderr: String::new(), exit_code: 0 }
}

#[cfg(not(unix))]
fn report_all() -> BuiltinResult {
    BuiltinResult::ok()
}

fn format_flag(flag: char) -> String {
    format!("-{}", flag)
}

fn format_rlim(value: u64, unit: u64) -> String {
    if value == libc::RLIM_INFINITY as u64 {
        "unlimited".to_string()
    } else {
        (value / unit.max(1)).to_string()
    }
}

#[cfg(unix)]
fn get_limit(spec: &LimitSpec, hard: bool) -> BuiltinResult {
    let mut lim: libc::rlimit = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrlimit(spec.resource, &mut lim) } != 0 {
        return BuiltinResult::failure("bash: ulimit: error getting limit\n", 1);
    }
    let value = if hard { lim.rlim_max } else { lim.rlim_cur };
    BuiltinResult { stdout: format!("{}\n", format_rlim(value, spec.unit)), stderr: String::new(), exit_code: 0 }
}

#[cfg(not(unix))]
fn get_limit(_spec: &LimitSpec, _hard: bool) -> BuiltinResult {
    BuiltinResult::failure("bash: ulimit: not supported on this platform\n", 1)
}

#[cfg(unix)]
fn set_limit(spec: &LimitSpec, value: &str, hard: bool, soft: bool) -> BuiltinResult {
    let mut lim: libc::rlimit = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrlimit(spec.resource, &mut lim) } != 0 {
        return BuiltinResult::failure("bash: ulimit: error getting limit\n", 1);
    }

    let raw = if value == "unlimited" {
        libc::RLIM_INFINITY as u64
    } else {
        match value.parse::<u64>() {
            Ok(n) => n * spec.unit,
            Err(_) => {
                return BuiltinResult::failure(&format!("bash: ulimit: {}: invalid number\n", value), 1);
            }
        }
    };

    if hard || !soft {
        lim.rlim_max = raw;
    }
    if soft || !hard {
        lim.rlim_cur = raw;
    }

    if unsafe { libc::setrlimit(spec.resource, &lim) } != 0 {
        return BuiltinResult::failure("bash: ulimit: cannot modify limit: Operation not permitted\n", 1);
    }
    BuiltinResult::ok()
}

#[cfg(not(unix))]
fn set_limit(_spec: &LimitSpec, _value: &str, _hard: bool, _soft: bool) -> BuiltinResult {
    BuiltinResult::failure("bash: ulimit: not supported on this platform\n", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_open_files_limit_reports_a_number() {
        let mut state = InterpreterState::default();
        let result = handle_ulimit(&mut state, &["-n".to_string()]);
        assert_eq!(result.exit_code, 0);
        assert!(!result.stdout.trim().is_empty());
    }

    #[test]
    fn invalid_option_fails() {
        let mut state = InterpreterState::default();
        let result = handle_ulimit(&mut state, &["-Z".to_string()]);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn invalid_numeric_value_fails() {
        let mut state = InterpreterState::default();
        let result = handle_ulimit(&mut state, &["-n".to_string(), "not-a-number".to_string()]);
        assert_eq!(result.exit_code, 1);
    }
}
