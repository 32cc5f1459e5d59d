//! test / [ - evaluate a conditional expression
//!
//! Grounded on the same unary/binary file-test and comparison semantics as
//! `[[ ]]` (see `conditional_eval::evaluate_unary`/`evaluate_binary`), but
//! operating directly on the already-expanded string arguments `test`/`[`
//! receive rather than on AST word nodes, and without `[[ ]]`'s glob-style
//! `==`/`=~` pattern matching.

use crate::interpreter::builtins::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::Path;

const UNARY_OPS: &[&str] = &[
    "-e", "-f", "-d", "-r", "-w", "-x", "-s", "-z", "-n", "-h", "-L", "-p", "-S", "-b", "-c", "-g",
    "-u", "-k", "-O", "-G", "-N", "-t", "-v", "-o",
];

const BINARY_OPS: &[&str] = &[
    "=", "==", "!=", "<", ">", "-eq", "-ne", "-lt", "-le", "-gt", "-ge", "-nt", "-ot", "-ef",
];

struct Parser<'a> {
    state: &'a InterpreterState,
    tokens: &'a [String],
    pos: usize,
}

type ParseResult = Result<bool, String>;

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn parse_or(&mut self) -> ParseResult {
        let mut left = self.parse_and()?;
        while self.peek() == Some("-o") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = left || right;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult {
        let mut left = self.parse_not()?;
        while self.peek() == Some("-a") {
            self.pos += 1;
            let right = self.parse_not()?;
            left = left && right;
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult {
        if self.peek() == Some("!") {
            self.pos += 1;
            return Ok(!self.parse_not()?);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult {
        let Some(tok) = self.peek().map(|s| s.to_string()) else {
            return Err("test: argument expected".to_string());
        };

        if tok == "(" {
            self.pos += 1;
            let result = self.parse_or()?;
            if self.peek() != Some(")") {
                return Err("test: missing `)'".to_string());
            }
            self.pos += 1;
            return Ok(result);
        }

        if UNARY_OPS.contains(&tok.as_str()) {
            let has_operand = self.pos + 1 < self.tokens.len() && self.tokens[self.pos + 1] != ")";
            if has_operand {
                let operand = self.tokens[self.pos + 1].clone();
                self.pos += 2;
                return eval_unary(self.state, &tok, &operand);
            }
            self.pos += 1;
            return Ok(!tok.is_empty());
        }

        if let Some(op) = self.tokens.get(self.pos + 1) {
            if BINARY_OPS.contains(&op.as_str()) {
                if let Some(right) = self.tokens.get(self.pos + 2) {
                    let left = tok.clone();
                    let op = op.clone();
                    let right = right.clone();
                    self.pos += 3;
                    return eval_binary(&op, &left, &right);
                }
            }
        }

        self.pos += 1;
        Ok(!tok.is_empty())
    }
}

fn eval_unary(state: &InterpreterState, op: &str, operand: &str) -> ParseResult {
    let path = Path::new(operand);
    Ok(match op {
        "-e" => path.exists(),
        "-f" => path.is_file(),
        "-d" => path.is_dir(),
        "-r" | "-w" => path.exists(),
        "-x" => path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false),
        "-s" => path.metadata().map(|m| m.len() > 0).unwrap_or(false),
        "-z" => operand.is_empty(),
        "-n" => !operand.is_empty(),
        "-h" | "-L" => path
            .symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false),
        "-p" => path.metadata().map(|m| m.file_type().is_fifo()).unwrap_or(false),
        "-S" => path.metadata().map(|m| m.file_type().is_socket()).unwrap_or(false),
        "-b" => path.metadata().map(|m| m.file_type().is_block_device()).unwrap_or(false),
        "-c" => path.metadata().map(|m| m.file_type().is_char_device()).unwrap_or(false),
        "-g" => path.metadata().map(|m| m.permissions().mode() & 0o2000 != 0).unwrap_or(false),
        "-u" => path.metadata().map(|m| m.permissions().mode() & 0o4000 != 0).unwrap_or(false),
        "-k" => path.metadata().map(|m| m.permissions().mode() & 0o1000 != 0).unwrap_or(false),
        "-O" => path.metadata().map(|m| m.uid() as i64 == unsafe { libc::geteuid() } as i64).unwrap_or(false),
        "-G" => path.metadata().map(|m| m.gid() as i64 == unsafe { libc::getegid() } as i64).unwrap_or(false),
        "-N" => path.metadata().map(|m| m.modified().ok() > m.accessed().ok()).unwrap_or(false),
        "-t" => operand.parse::<i32>().map(|fd| unsafe { libc::isatty(fd) == 1 }).unwrap_or(false),
        "-v" => state.env.contains_key(operand),
        "-o" => crate::interpreter::conditionals::evaluate_shell_option(state, operand),
        _ => return Err(format!("test: {}: unknown unary operator", op)),
    })
}

fn eval_binary(op: &str, left: &str, right: &str) -> ParseResult {
    use crate::interpreter::conditionals::parse_numeric;
    Ok(match op {
        "=" | "==" => left == right,
        "!=" => left != right,
        "<" => left < right,
        ">" => left > right,
        "-eq" => parse_numeric(left) == parse_numeric(right),
        "-ne" => parse_numeric(left) != parse_numeric(right),
        "-lt" => parse_numeric(left) < parse_numeric(right),
        "-le" => parse_numeric(left) <= parse_numeric(right),
        "-gt" => parse_numeric(left) > parse_numeric(right),
        "-ge" => parse_numeric(left) >= parse_numeric(right),
        "-nt" | "-ot" | "-ef" => {
            let lm = std::fs::metadata(left);
            let rm = std::fs::metadata(right);
            match (op, lm, rm) {
                ("-nt", Ok(l), Ok(r)) => l.modified().ok() > r.modified().ok(),
                ("-nt", Ok(_), Err(_)) => true,
                ("-ot", Ok(l), Ok(r)) => l.modified().ok() < r.modified().ok(),
                ("-ot", Err(_), Ok(_)) => true,
                ("-ef", Ok(l), Ok(r)) => l.ino() == r.ino() && l.dev() == r.dev(),
                _ => false,
            }
        }
        _ => return Err(format!("test: {}: unknown binary operator", op)),
    })
}

/// Evaluate `test`/`[` arguments (the closing `]` already stripped by the
/// caller) and report the result as an exit code: 0 true, 1 false, 2 error.
pub fn handle_test(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        return BuiltinResult { stdout: String::new(), stderr: String::new(), exit_code: 1 };
    }

    let mut parser = Parser { state, tokens: args, pos: 0 };
    match parser.parse_or() {
        Ok(result) => {
            if parser.pos != args.len() {
                return BuiltinResult::failure("bash: test: too many arguments\n", 2);
            }
            BuiltinResult { stdout: String::new(), stderr: String::new(), exit_code: if result { 0 } else { 1 } }
        }
        Err(msg) => BuiltinResult::failure(&format!("bash: {}\n", msg), 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_nonempty_string_is_true() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["foo"])).exit_code, 0);
    }

    #[test]
    fn single_empty_string_is_false() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&[""])).exit_code, 1);
    }

    #[test]
    fn string_equality() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["foo", "=", "foo"])).exit_code, 0);
        assert_eq!(handle_test(&state, &args(&["foo", "!=", "bar"])).exit_code, 0);
    }

    #[test]
    fn numeric_comparison() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["3", "-lt", "5"])).exit_code, 0);
        assert_eq!(handle_test(&state, &args(&["5", "-lt", "3"])).exit_code, 1);
    }

    #[test]
    fn negation() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["!", "foo", "=", "bar"])).exit_code, 0);
    }

    #[test]
    fn and_or_combinators() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["foo", "=", "foo", "-a", "1", "-lt", "2"])).exit_code, 0);
        assert_eq!(handle_test(&state, &args(&["foo", "=", "bar", "-o", "1", "-lt", "2"])).exit_code, 0);
    }

    #[test]
    fn file_exists_check() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["-e", "/"])).exit_code, 0);
        assert_eq!(handle_test(&state, &args(&["-e", "/no/such/path/xyz"])).exit_code, 1);
    }

    #[test]
    fn parenthesized_group() {
        let state = InterpreterState::default();
        assert_eq!(handle_test(&state, &args(&["(", "foo", "=", "foo", ")"])).exit_code, 0);
    }
}
