//! umask - get or set the file creation mode mask.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_umask(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let symbolic = args.iter().any(|a| a == "-S");
    let operand = args.iter().find(|a| !a.starts_with('-'));

    let Some(value) = operand else {
        return if symbolic {
            BuiltinResult { stdout: format!("{}\n", symbolic_mask(state.umask)), stderr: String::new(), exit_code: 0 }
        } else {
            BuiltinResult { stdout: format!("{:04o}\n", state.umask), stderr: String::new(), exit_code: 0 }
        };
    };

    match u32::from_str_radix(value, 8) {
        Ok(mask) if mask <= 0o777 => {
            state.umask = mask;
            BuiltinResult::ok()
        }
        _ => BuiltinResult::failure(&format!("bash: umask: {}: octal number out of range\n", value), 1),
    }
}

fn symbolic_mask(umask: u32) -> String {
    let perm = !umask & 0o777;
    let class = |shift: u32| {
        let bits = (perm >> shift) & 0o7;
        let mut s = String::new();
        if bits & 0o4 != 0 { s.push('r'); }
        if bits & 0o2 != 0 { s.push('w'); }
        if bits & 0o1 != 0 { s.push('x'); }
        s
    };
    format!("u={},g={},o={}", class(6), class(3), class(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_default_umask() {
        let mut state = InterpreterState::default();
        let r = handle_umask(&mut state, &[]);
        assert_eq!(r.stdout, "0022\n");
    }

    #[test]
    fn sets_new_umask() {
        let mut state = InterpreterState::default();
        handle_umask(&mut state, &["077".to_string()]);
        assert_eq!(state.umask, 0o077);
    }

    #[test]
    fn rejects_out_of_range_value() {
        let mut state = InterpreterState::default();
        let r = handle_umask(&mut state, &["9999".to_string()]);
        assert_eq!(r.exit_code, 1);
    }
}
