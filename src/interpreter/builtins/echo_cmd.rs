//! echo - write arguments to stdout, with optional backslash-escape processing.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_echo(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let mut suppress_newline = false;
    let mut interpret_escapes = state.shopt_options.xpg_echo;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        if arg == "--" {
            i += 1;
            break;
        }
        if arg.len() < 2 || !arg.starts_with('-') {
            break;
        }
        if !arg[1..].chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
            break;
        }
        for ch in arg[1..].chars() {
            match ch {
                'n' => suppress_newline = true,
                'e' => interpret_escapes = true,
                'E' => interpret_escapes = false,
                _ => {}
            }
        }
        i += 1;
    }

    let rest = &args[i..];
    let mut output = rest.join(" ");
    let mut stop_output = false;

    if interpret_escapes {
        let (processed, stopped) = process_escapes(&output);
        output = processed;
        stop_output = stopped;
    }

    if !stop_output && !suppress_newline {
        output.push('\n');
    }

    BuiltinResult { stdout: output, stderr: String::new(), exit_code: 0 }
}

/// Process backslash escapes per `echo -e`. Returns the processed string and
/// whether `\c` was seen (which suppresses all further output, including the
/// trailing newline).
fn process_escapes(input: &str) -> (String, bool) {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars[i + 1] {
            '\\' => { out.push('\\'); i += 2; }
            'n' => { out.push('\n'); i += 2; }
            't' => { out.push('\t'); i += 2; }
            'r' => { out.push('\r'); i += 2; }
            'a' => { out.push('\x07'); i += 2; }
            'b' => { out.push('\x08'); i += 2; }
            'f' => { out.push('\x0c'); i += 2; }
            'v' => { out.push('\x0b'); i += 2; }
            'e' | 'E' => { out.push('\x1b'); i += 2; }
            'c' => return (out, true),
            '0' => {
                let mut oct = String::new();
                let mut j = i + 2;
                while j < chars.len() && j < i + 5 && ('0'..='7').contains(&chars[j]) {
                    oct.push(chars[j]);
                    j += 1;
                }
                let code = if oct.is_empty() { 0 } else { u32::from_str_radix(&oct, 8).unwrap_or(0) % 256 };
                if let Some(c) = char::from_u32(code) { out.push(c); }
                i = j;
            }
            'x' => {
                let mut hex = String::new();
                let mut j = i + 2;
                while j < chars.len() && j < i + 4 && chars[j].is_ascii_hexdigit() {
                    hex.push(chars[j]);
                    j += 1;
                }
                if hex.is_empty() {
                    out.push_str("\\x");
                    i += 2;
                } else {
                    let code = u32::from_str_radix(&hex, 16).unwrap_or(0);
                    if let Some(c) = char::from_u32(code) { out.push(c); }
                    i = j;
                }
            }
            'u' => {
                let (code, j) = read_hex(&chars, i + 2, 4);
                if let Some(c) = char::from_u32(code) { out.push(c); }
                i = j;
            }
            'U' => {
                let (code, j) = read_hex(&chars, i + 2, 8);
                if let Some(c) = char::from_u32(code) { out.push(c); }
                i = j;
            }
            other => {
                out.push('\\');
                out.push(other);
                i += 2;
            }
        }
    }
    (out, false)
}

fn read_hex(chars: &[char], start: usize, max_digits: usize) -> (u32, usize) {
    let mut hex = String::new();
    let mut j = start;
    while j < chars.len() && j < start + max_digits && chars[j].is_ascii_hexdigit() {
        hex.push(chars[j]);
        j += 1;
    }
    (u32::from_str_radix(&hex, 16).unwrap_or(0), j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &[&str]) -> BuiltinResult {
        let state = InterpreterState::default();
        handle_echo(&state, &args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn plain_args_joined_with_space() {
        assert_eq!(echo(&["hello", "world"]).stdout, "hello world\n");
    }

    #[test]
    fn dash_n_suppresses_newline() {
        assert_eq!(echo(&["-n", "hi"]).stdout, "hi");
    }

    #[test]
    fn dash_e_interprets_escapes() {
        assert_eq!(echo(&["-e", "a\\tb"]).stdout, "a\tb\n");
    }

    #[test]
    fn dash_capital_e_disables_escapes() {
        assert_eq!(echo(&["-E", "a\\tb"]).stdout, "a\\tb\n");
    }

    #[test]
    fn backslash_c_stops_all_output() {
        assert_eq!(echo(&["-e", "abc\\cdef"]).stdout, "abc");
    }
}
