//! Evaluates `[[ expression ]]` conditional command expressions.
//!
//! Grounded on the existing `conditionals.rs` glob/regex helpers (`match_pattern`,
//! `posix_ere_to_regex`, `parse_numeric`) and `word_expansion::expand_word_no_glob` for
//! operand expansion. `[[ ]]` operands are expanded but not word-split or
//! globbed, matching bash's quoting-insensitive-but-no-splitting behavior.

use crate::ast::types::{
    CondBinaryNode, CondBinaryOperator, CondUnaryNode, CondUnaryOperator, ConditionalExpressionNode,
};
use crate::interpreter::conditionals::{match_pattern, parse_numeric, posix_ere_to_regex};
use crate::interpreter::interpreter::ExecuteScriptFn;
use crate::interpreter::types::InterpreterState;
use crate::interpreter::word_expansion::expand_word_no_glob;

/// Evaluate a `[[ ]]` expression tree. Returns the boolean result plus any
/// stderr produced (e.g. an invalid regex in `=~`).
pub fn evaluate_conditional(
    state: &mut InterpreterState,
    expr: &ConditionalExpressionNode,
    exec_script: &ExecuteScriptFn,
) -> (bool, String) {
    match expr {
        ConditionalExpressionNode::Word(w) => {
            let val = expand_word_no_glob(state, &w.word, exec_script).value;
            (!val.is_empty(), String::new())
        }
        ConditionalExpressionNode::Not(n) => {
            let (r, err) = evaluate_conditional(state, &n.operand, exec_script);
            (!r, err)
        }
        ConditionalExpressionNode::And(n) => {
            let (l, err) = evaluate_conditional(state, &n.left, exec_script);
            if !l {
                return (false, err);
            }
            evaluate_conditional(state, &n.right, exec_script)
        }
        ConditionalExpressionNode::Or(n) => {
            let (l, err) = evaluate_conditional(state, &n.left, exec_script);
            if l {
                return (true, err);
            }
            evaluate_conditional(state, &n.right, exec_script)
        }
        ConditionalExpressionNode::Group(g) => evaluate_conditional(state, &g.expression, exec_script),
        ConditionalExpressionNode::Unary(u) => (evaluate_unary(state, u, exec_script), String::new()),
        ConditionalExpressionNode::Binary(b) => evaluate_binary(state, b, exec_script),
    }
}

fn evaluate_unary(state: &mut InterpreterState, node: &CondUnaryNode, exec_script: &ExecuteScriptFn) -> bool {
    let operand = expand_word_no_glob(state, &node.operand, exec_script).value;
    use CondUnaryOperator::*;
    let path = std::path::Path::new(&operand);
    match node.operator {
        E => path.exists(),
        D => path.is_dir(),
        F => path.is_file(),
        R | W | X => {
            // No portable readable/writable/executable probe without trying
            // the operation; fall back to existence plus, for X, the execute bit.
            if node.operator == X {
                path.metadata().map(|m| {
                    use std::os::unix::fs::PermissionsExt;
                    m.permissions().mode() & 0o111 != 0
                }).unwrap_or(false)
            } else {
                path.exists()
            }
        }
        S => path.metadata().map(|m| m.len() > 0).unwrap_or(false),
        Z => operand.is_empty(),
        LowerN => !operand.is_empty(),
        L | H => path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false),
        B => path.metadata().map(|m| {
            use std::os::unix::fs::FileTypeExt;
            m.file_type().is_block_device()
        }).unwrap_or(false),
        C => path.metadata().map(|m| {
            use std::os::unix::fs::FileTypeExt;
            m.file_type().is_char_device()
        }).unwrap_or(false),
        P => path.metadata().map(|m| {
            use std::os::unix::fs::FileTypeExt;
            m.file_type().is_fifo()
        }).unwrap_or(false),
        UpperS => path.metadata().map(|m| {
            use std::os::unix::fs::FileTypeExt;
            m.file_type().is_socket()
        }).unwrap_or(false),
        G => path.metadata().map(|m| {
            use std::os::unix::fs::PermissionsExt;
            m.permissions().mode() & 0o2000 != 0
        }).unwrap_or(false),
        U => path.metadata().map(|m| {
            use std::os::unix::fs::PermissionsExt;
            m.permissions().mode() & 0o4000 != 0
        }).unwrap_or(false),
        K => path.metadata().map(|m| {
            use std::os::unix::fs::PermissionsExt;
            m.permissions().mode() & 0o1000 != 0
        }).unwrap_or(false),
        UpperG => path.metadata().map(|m| m.gid() as i64 == unsafe { libc::getegid() } as i64).unwrap_or(false),
        UpperO => path.metadata().map(|m| m.uid() as i64 == unsafe { libc::geteuid() } as i64).unwrap_or(false),
        LowerO => state.options_is_set(&operand),
        V => state.env.contains_key(&operand),
        UpperR => false,
        N => path.metadata().map(|m| m.modified().ok() > m.accessed().ok()).unwrap_or(false),
        A => path.exists(),
        T => operand.parse::<i32>().map(|fd| unsafe { libc::isatty(fd) == 1 }).unwrap_or(false),
    }
}

// bring `MetadataExt::gid`/`uid` into scope for the unary checks above
#[allow(unused_imports)]
use std::os::unix::fs::MetadataExt;

impl InterpreterState {
    fn options_is_set(&self, name: &str) -> bool {
        crate::interpreter::conditionals::evaluate_shell_option(self, name)
    }
}

fn evaluate_binary(state: &mut InterpreterState, node: &CondBinaryNode, exec_script: &ExecuteScriptFn) -> (bool, String) {
    let left = expand_word_no_glob(state, &node.left, exec_script).value;
    use CondBinaryOperator::*;
    match node.operator {
        Eq | EqEq => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            (match_pattern(&left, &right, state.shopt_options.nocasematch, state.shopt_options.extglob), String::new())
        }
        Ne => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            (!match_pattern(&left, &right, state.shopt_options.nocasematch, state.shopt_options.extglob), String::new())
        }
        Lt => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            (left < right, String::new())
        }
        Gt => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            (left > right, String::new())
        }
        Match => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            let pattern = posix_ere_to_regex(&right);
            match regex_lite::Regex::new(&pattern) {
                Ok(re) => {
                    if let Some(caps) = re.captures(&left) {
                        let mut groups = vec![left.clone()];
                        for i in 1..caps.len() {
                            groups.push(caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default());
                        }
                        state.env.insert("BASH_REMATCH_COUNT".into(), groups.len().to_string());
                        for (i, g) in groups.iter().enumerate() {
                            state.env.insert(format!("BASH_REMATCH_{}", i), g.clone());
                        }
                        (true, String::new())
                    } else {
                        (false, String::new())
                    }
                }
                Err(e) => (false, format!("bash: =~: {}: invalid regex\n", e)),
            }
        }
        NumEq | NumNe | NumLt | NumLe | NumGt | NumGe => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            let l = parse_numeric(&left);
            let r = parse_numeric(&right);
            let result = match node.operator {
                NumEq => l == r,
                NumNe => l != r,
                NumLt => l < r,
                NumLe => l <= r,
                NumGt => l > r,
                NumGe => l >= r,
                _ => unreachable!(),
            };
            (result, String::new())
        }
        Nt | Ot | Ef => {
            let right = expand_word_no_glob(state, &node.right, exec_script).value;
            let lm = std::fs::metadata(&left);
            let rm = std::fs::metadata(&right);
            let result = match (node.operator, lm, rm) {
                (Nt, Ok(l), Ok(r)) => l.modified().ok() > r.modified().ok(),
                (Nt, Ok(_), Err(_)) => true,
                (Ot, Ok(l), Ok(r)) => l.modified().ok() < r.modified().ok(),
                (Ot, Err(_), Ok(_)) => true,
                (Ef, Ok(l), Ok(r)) => l.ino() == r.ino() && l.dev() == r.dev(),
                _ => false,
            };
            (result, String::new())
        }
    }
}
