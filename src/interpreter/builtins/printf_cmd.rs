//! printf - format and print arguments, POSIX-ish format-string handling.
//!
//! Ported from the sandboxed coreutils `printf` reimplementation's format
//! engine, made synchronous and operating on `&InterpreterState` instead of
//! an async command context.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;

const HELP: &str = "Usage: printf FORMAT [ARGUMENT]...\n";

pub fn handle_printf(_state: &InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        return BuiltinResult::failure("bash: printf: usage: printf format [arguments]\n", 2);
    }
    if args.iter().any(|a| a == "--help") {
        return BuiltinResult { stdout: HELP.to_string(), stderr: String::new(), exit_code: 0 };
    }

    let format = &args[0];
    let arguments: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();
    let mut output = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut arg_idx = 0;

    loop {
        let start_arg_idx = arg_idx;
        let chars: Vec<char> = format.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            if chars[i] == '\\' {
                let (esc, advance) = process_escape(&chars, i);
                output.push_str(&esc);
                i += advance;
            } else if chars[i] == '%' {
                if i + 1 >= chars.len() { output.push('%'); i += 1; continue; }
                if chars[i + 1] == '%' { output.push('%'); i += 2; continue; }
                let (formatted, advance, consumed, parse_err) = process_format_spec(&chars, i, &arguments, arg_idx);
                output.push_str(&formatted);
                arg_idx += consumed;
                i += advance;
                if let Some(err_msg) = parse_err {
                    stderr.push_str(&err_msg);
                    exit_code = 1;
                }
            } else {
                output.push(chars[i]);
                i += 1;
            }
        }

        if arg_idx <= start_arg_idx || arg_idx >= arguments.len() {
            break;
        }
    }

    BuiltinResult { stdout: output, stderr, exit_code }
}

fn process_escape(chars: &[char], pos: usize) -> (String, usize) {
    if pos + 1 >= chars.len() { return ("\\".into(), 1); }
    let next = chars[pos + 1];
    match next {
        '\\' => ("\\".into(), 2),
        'n' => ("\n".into(), 2),
        't' => ("\t".into(), 2),
        'r' => ("\r".into(), 2),
        'a' => ("\x07".into(), 2),
        'b' => ("\x08".into(), 2),
        'f' => ("\x0c".into(), 2),
        'v' => ("\x0b".into(), 2),
        'e' | 'E' => ("\x1b".into(), 2),
        '0' => {
            let mut oct = String::new();
            let mut j = pos + 2;
            while j < chars.len() && j < pos + 5 && chars[j] >= '0' && chars[j] <= '7' { oct.push(chars[j]); j += 1; }
            let code = if oct.is_empty() { 0 } else { u32::from_str_radix(&oct, 8).unwrap_or(0) % 256 };
            (char::from_u32(code).map_or(String::new(), |c| c.to_string()), j - pos)
        }
        'x' => {
            let mut hex = String::new();
            let mut j = pos + 2;
            while j < chars.len() && j < pos + 4 && chars[j].is_ascii_hexdigit() { hex.push(chars[j]); j += 1; }
            if hex.is_empty() { ("\\x".into(), 2) }
            else { let code = u32::from_str_radix(&hex, 16).unwrap_or(0); (char::from_u32(code).map_or(String::new(), |c| c.to_string()), j - pos) }
        }
        'u' => {
            let mut hex = String::new();
            let mut j = pos + 2;
            while j < chars.len() && j < pos + 6 && chars[j].is_ascii_hexdigit() { hex.push(chars[j]); j += 1; }
            if hex.is_empty() { ("\\u".into(), 2) }
            else { let code = u32::from_str_radix(&hex, 16).unwrap_or(0); (char::from_u32(code).map_or(String::new(), |c| c.to_string()), j - pos) }
        }
        'U' => {
            let mut hex = String::new();
            let mut j = pos + 2;
            while j < chars.len() && j < pos + 10 && chars[j].is_ascii_hexdigit() { hex.push(chars[j]); j += 1; }
            if hex.is_empty() { ("\\U".into(), 2) }
            else { let code = u32::from_str_radix(&hex, 16).unwrap_or(0); (char::from_u32(code).map_or(String::new(), |c| c.to_string()), j - pos) }
        }
        '1'..='7' => {
            let mut oct = String::new();
            oct.push(next);
            let mut j = pos + 2;
            while j < chars.len() && j < pos + 4 && chars[j] >= '0' && chars[j] <= '7' { oct.push(chars[j]); j += 1; }
            let code = u32::from_str_radix(&oct, 8).unwrap_or(0) % 256;
            (char::from_u32(code).map_or(String::new(), |c| c.to_string()), j - pos)
        }
        _ => { let mut s = String::from('\\'); s.push(next); (s, 2) }
    }
}

/// Returns (formatted_str, chars_advanced, args_consumed, optional_error_msg)
fn process_format_spec(chars: &[char], pos: usize, args: &[&str], arg_idx: usize) -> (String, usize, usize, Option<String>) {
    let mut i = pos + 1;
    while i < chars.len() && "-+ 0#'".contains(chars[i]) { i += 1; }
    while i < chars.len() && chars[i].is_ascii_digit() { i += 1; }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() { i += 1; }
    }
    if i >= chars.len() { return ("%".into(), 1, 0, None); }

    let specifier = chars[i];
    let spec_str: String = chars[pos..=i].iter().collect();
    let advance = i - pos + 1;
    let arg = if arg_idx < args.len() { args[arg_idx] } else { "" };

    match specifier {
        's' => (apply_string_format(&spec_str, arg), advance, 1, None),
        'd' | 'i' => {
            let (val, err) = parse_int_arg(arg);
            (apply_int_format(&spec_str, val), advance, 1, err)
        }
        'f' | 'g' | 'e' => {
            let (val, err) = parse_float_arg(arg);
            (apply_float_format(&spec_str, val, specifier), advance, 1, err)
        }
        'x' | 'X' => {
            let (val, err) = parse_int_arg(arg);
            (apply_hex_format(val, specifier), advance, 1, err)
        }
        'o' => {
            let (val, err) = parse_int_arg(arg);
            (format!("{:o}", val as u64), advance, 1, err)
        }
        'c' => {
            let ch = arg.chars().next();
            (ch.map(|c| c.to_string()).unwrap_or_default(), advance, 1, None)
        }
        'b' => (process_b_escape(arg), advance, 1, None),
        'q' => (shell_quote(arg), advance, 1, None),
        _ => (spec_str, advance, 0, None),
    }
}

fn parse_int_arg(s: &str) -> (i64, Option<String>) {
    if s.is_empty() { return (0, None); }
    if s.len() >= 2 && (s.starts_with('\'') || s.starts_with('"')) {
        return (s.chars().nth(1).unwrap_or('\0') as i64, None);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return match i64::from_str_radix(hex, 16) {
            Ok(v) => (v, None),
            Err(_) => (0, Some(format!("bash: printf: {}: invalid number\n", s))),
        };
    }
    if s.starts_with('0') && s.len() > 1 && s.chars().skip(1).all(|c| ('0'..='7').contains(&c)) {
        return match i64::from_str_radix(&s[1..], 8) {
            Ok(v) => (v, None),
            Err(_) => (0, Some(format!("bash: printf: {}: invalid number\n", s))),
        };
    }
    match s.parse::<i64>() {
        Ok(v) => (v, None),
        Err(_) => (0, Some(format!("bash: printf: {}: invalid number\n", s))),
    }
}

fn parse_float_arg(s: &str) -> (f64, Option<String>) {
    if s.is_empty() { return (0.0, None); }
    match s.parse::<f64>() {
        Ok(v) => (v, None),
        Err(_) => (0.0, Some(format!("bash: printf: {}: invalid number\n", s))),
    }
}

fn apply_string_format(spec: &str, val: &str) -> String {
    let inner = &spec[1..spec.len() - 1];
    let left_justify = inner.contains('-');
    let inner = inner.replace('-', "");
    let (width, precision) = parse_width_prec(&inner);
    let mut s = val.to_string();
    if let Some(p) = precision {
        if s.len() > p { s.truncate(p); }
    }
    pad(&mut s, width, left_justify, ' ');
    s
}

fn apply_int_format(spec: &str, val: i64) -> String {
    let inner = &spec[1..spec.len() - 1];
    let left_justify = inner.contains('-');
    let zero_pad = inner.contains('0') && !left_justify;
    let plus = inner.contains('+');
    let space = inner.contains(' ');
    let clean: String = inner.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let (width, _) = parse_width_prec(&clean);
    let mut s = if val < 0 { format!("{}", val) }
        else if plus { format!("+{}", val) }
        else if space { format!(" {}", val) }
        else { format!("{}", val) };
    if let Some(w) = width {
        if s.len() < w {
            if zero_pad && (s.starts_with('-') || s.starts_with('+') || s.starts_with(' ')) {
                let sign = s.remove(0);
                let padding = "0".repeat(w - 1 - s.len());
                s = format!("{}{}{}", sign, padding, s);
            } else {
                pad(&mut s, Some(w), left_justify, if zero_pad { '0' } else { ' ' });
            }
        }
    }
    s
}

fn apply_float_format(spec: &str, val: f64, specifier: char) -> String {
    let inner = &spec[1..spec.len() - 1];
    let left_justify = inner.contains('-');
    let zero_pad = inner.contains('0') && !left_justify;
    let clean: String = inner.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let (width, precision) = parse_width_prec(&clean);
    let prec = precision.unwrap_or(6);
    let mut s = match specifier {
        'e' | 'E' => format!("{:.*e}", prec, val),
        'g' | 'G' => format!("{:.*}", prec, val),
        _ => format!("{:.prec$}", val, prec = prec),
    };
    pad(&mut s, width, left_justify, if zero_pad { '0' } else { ' ' });
    s
}

fn apply_hex_format(val: i64, specifier: char) -> String {
    if specifier == 'X' { format!("{:X}", val as u64) } else { format!("{:x}", val as u64) }
}

fn pad(s: &mut String, width: Option<usize>, left_justify: bool, pad_char: char) {
    if let Some(w) = width {
        if s.len() < w {
            let padding: String = std::iter::repeat(pad_char).take(w - s.len()).collect();
            *s = if left_justify { format!("{}{}", s, " ".repeat(w - s.len())) } else { format!("{}{}", padding, s) };
        }
    }
}

fn parse_width_prec(s: &str) -> (Option<usize>, Option<usize>) {
    if s.is_empty() { return (None, None); }
    let parts: Vec<&str> = s.splitn(2, '.').collect();
    let width = if !parts[0].is_empty() { parts[0].parse().ok() } else { None };
    let precision = if parts.len() > 1 { parts[1].parse().ok() } else { None };
    (width, precision)
}

fn process_b_escape(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            let (esc, adv) = process_escape(&chars, i);
            result.push_str(&esc);
            i += adv;
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }
    result
}

fn shell_quote(s: &str) -> String {
    if s.is_empty() { return "''".to_string(); }
    if s.chars().all(|c| c.is_alphanumeric() || "-_./,:@".contains(c)) { return s.to_string(); }
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printf(args: &[&str]) -> BuiltinResult {
        let state = InterpreterState::default();
        handle_printf(&state, &args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn string_and_int() {
        assert_eq!(printf(&["Hello %s", "world"]).stdout, "Hello world");
        assert_eq!(printf(&["Number: %d", "42"]).stdout, "Number: 42");
    }

    #[test]
    fn repeats_format_for_extra_args() {
        assert_eq!(printf(&["%s-", "a", "b", "c"]).stdout, "a-b-c-");
    }

    #[test]
    fn width_and_precision() {
        assert_eq!(printf(&["%5d", "3"]).stdout, "    3");
        assert_eq!(printf(&["%.2f", "3.14159"]).stdout, "3.14");
    }

    #[test]
    fn invalid_number_sets_nonzero_exit() {
        let r = printf(&["%d", "abc"]);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("invalid number"));
    }
}
