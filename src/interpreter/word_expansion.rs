//! Word Expansion
//!
//! The top-level entry point for shell word expansion, composing the
//! individual pieces in `interpreter::expansion::*` into the ordering bash
//! itself uses: brace expansion, then per-part expansion (tilde, parameter,
//! command substitution, arithmetic), then IFS word splitting, then pathname
//! (glob) expansion. Quote removal falls out naturally since quoted parts
//! are expanded to plain strings directly.

use crate::ast::types::{
    ArrayKeysOp, BraceItem, CaseDirection, CaseModificationOp, InnerParameterOperation,
    IndirectionOp, ParameterExpansionPart, ParameterOperation, PatternAnchor,
    PatternRemovalOp, PatternRemovalSide as AstPatternRemovalSide, PatternReplacementOp,
    ScriptNode, SubstringOp, TransformOp, UseAlternativeOp, VarNamePrefixOp, WordNode, WordPart,
};
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::expansion::indirect_expansion::expand_indirect_array;
use crate::interpreter::expansion::parameter_ops::{
    apply_case_modification, apply_pattern_removal_op, apply_pattern_replacement_op,
    apply_substring_op, apply_transform_op, get_array_keys, get_parameter_length,
    get_var_names_with_prefix_op, should_use_alternative, should_use_default, ParameterOpContext,
};
use crate::interpreter::expansion::positional_params::{
    apply_positional_pattern_removal, apply_positional_pattern_replacement,
};
use crate::interpreter::expansion::word_split::{is_part_splittable, WordSplitSegment};
use crate::interpreter::helpers::get_ifs;
use crate::interpreter::helpers::word_parts::is_quoted_part;
use crate::interpreter::interpreter::ExecuteScriptFn;
use crate::interpreter::types::{ExecutionLimits, InterpreterContext, InterpreterState};

// Re-export commonly used expansion functions so downstream callers (builtins,
// conditionals) can keep importing them from this module as before.
pub use crate::interpreter::expansion::analysis::*;
pub use crate::interpreter::expansion::brace_range::*;
pub use crate::interpreter::expansion::glob_escape::*;
pub use crate::interpreter::expansion::pattern::*;
pub use crate::interpreter::expansion::pattern_removal::*;
pub use crate::interpreter::expansion::quoting::*;
pub use crate::interpreter::expansion::tilde::*;
pub use crate::interpreter::expansion::variable::*;
pub use crate::interpreter::expansion::word_split::*;

/// Result of word expansion.
#[derive(Debug, Clone)]
pub struct WordExpansionResult {
    /// The expanded string value
    pub value: String,
    /// Whether the expansion produced multiple words (from word splitting)
    pub split_words: Option<Vec<String>>,
    /// Any stderr output from command substitutions
    pub stderr: String,
    /// Exit code from command substitutions (if any)
    pub exit_code: Option<i32>,
}

impl WordExpansionResult {
    /// Create a simple result with just a value.
    pub fn simple(value: String) -> Self {
        Self { value, split_words: None, stderr: String::new(), exit_code: None }
    }

    /// Create a result with split words.
    pub fn with_split(value: String, words: Vec<String>) -> Self {
        Self { value, split_words: Some(words), stderr: String::new(), exit_code: None }
    }
}

/// Options for word expansion.
#[derive(Debug, Clone, Default)]
pub struct WordExpansionOptions {
    /// Whether we're inside double quotes
    pub in_double_quotes: bool,
    /// Whether to perform word splitting
    pub do_word_split: bool,
    /// Whether to perform glob expansion
    pub do_glob: bool,
    /// Whether to preserve empty fields
    pub preserve_empty: bool,
    /// Whether extglob is enabled
    pub extglob: bool,
}

/// Callback type for command substitution execution (legacy shape, kept for
/// callers that only have the substituted source text rather than a parsed
/// `ScriptNode`). Most of this module drives substitution through
/// `ExecuteScriptFn` instead, since `CommandSubstitutionPart` already carries
/// a parsed body.
pub type CommandSubstitutionFn = Box<dyn Fn(&str, &mut InterpreterState) -> ExecResult + Send + Sync>;

use crate::interpreter::types::ExecResult;

/// Final result of expanding one source word into zero or more argv words
/// (after brace expansion, splitting and globbing).
#[derive(Debug, Clone, Default)]
pub struct ArgumentExpansionResult {
    pub words: Vec<String>,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Expand a word to a single scalar value: tilde, parameter, command
/// substitution and arithmetic expansion, but no word splitting or globbing.
/// Used for contexts that always want one string (assignment RHS, here-doc
/// delimiters, `case` words, redirection targets).
pub fn expand_word_no_glob(
    state: &mut InterpreterState,
    word: &WordNode,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    let mut out = WordExpansionResult::simple(String::new());
    for part in &word.parts {
        let expanded = expand_part(state, part, false, exec_script);
        out.value.push_str(&expanded.value);
        out.stderr.push_str(&expanded.stderr);
        if expanded.exit_code.is_some() {
            out.exit_code = expanded.exit_code;
        }
    }
    out
}

/// Expand a single source word into the final list of argv words: brace
/// expansion, per-part expansion, IFS splitting, and pathname expansion, in
/// that order.
pub fn expand_argument_words(
    state: &mut InterpreterState,
    word: &WordNode,
    exec_script: &ExecuteScriptFn,
) -> ArgumentExpansionResult {
    let mut result = ArgumentExpansionResult::default();

    let braced = brace_expand_word(word);

    for braced_word in &braced {
        let fully_quoted = is_word_fully_quoted(braced_word);
        let words = expand_one_braced_word(state, braced_word, exec_script, &mut result);

        if state.options.noglob || fully_quoted {
            result.words.extend(words);
        } else {
            for w in words {
                result.words.extend(glob_expand_one(state, &w));
            }
        }
    }

    result
}

fn glob_expand_one(state: &InterpreterState, pattern: &str) -> Vec<String> {
    use crate::interpreter::expansion::word_glob_expansion::{expand_glob_pattern_with, GlobWalkOptions};
    use std::path::Path;

    let options = GlobWalkOptions {
        globstar: state.shopt_options.globstar,
        dotglob: state.shopt_options.dotglob,
        extglob: state.shopt_options.extglob,
        globskipdots: state.shopt_options.globskipdots,
    };
    match expand_glob_pattern_with(
        pattern,
        Path::new(&state.cwd),
        state.shopt_options.failglob,
        state.shopt_options.nullglob,
        options,
        state.env.get("GLOBIGNORE").map(|s| s.as_str()),
    ) {
        Ok(r) => r.values,
        Err(_) => vec![pattern.to_string()],
    }
}

/// Expand one (already brace-expanded) word into a list of pre-glob words,
/// handling the `$@`/array-`[@]` "each element is its own word" special case
/// and IFS splitting for everything else.
fn expand_one_braced_word(
    state: &mut InterpreterState,
    word: &WordNode,
    exec_script: &ExecuteScriptFn,
    result: &mut ArgumentExpansionResult,
) -> Vec<String> {
    // Special case: a word consisting of exactly one unquoted "$@"-shaped
    // parameter expansion (or "${arr[@]}") expands to one argv word per
    // positional parameter / array element, bypassing IFS reconstruction.
    if word.parts.len() == 1 {
        if let Some(multi) = expand_multi_word_part(state, &word.parts[0], false) {
            return multi;
        }
    }
    if word.parts.len() == 1 {
        if let WordPart::DoubleQuoted(dq) = &word.parts[0] {
            if dq.parts.len() == 1 {
                if let Some(multi) = expand_multi_word_part(state, &dq.parts[0], true) {
                    return multi;
                }
            }
        }
    }

    let mut segments = Vec::with_capacity(word.parts.len());
    for part in &word.parts {
        let expanded = expand_part(state, part, false, exec_script);
        result.stderr.push_str(&expanded.stderr);
        if expanded.exit_code.is_some() {
            result.exit_code = expanded.exit_code;
        }
        segments.push(WordSplitSegment {
            value: expanded.value,
            is_splittable: is_part_splittable(part),
            is_quoted: is_quoted_part(part),
        });
    }

    let ifs_chars = get_ifs(&state.env);
    smart_word_split(&segments, ifs_chars).words
}

/// If `part` is a bare reference to `$@`, `$*`, `${arr[@]}` or `${arr[*]}`,
/// return its expansion as a list of independent words (for `@`) or a single
/// IFS-joined word (for `*`). Returns `None` for anything else.
fn expand_multi_word_part(
    state: &InterpreterState,
    part: &WordPart,
    quoted: bool,
) -> Option<Vec<String>> {
    let WordPart::ParameterExpansion(pe) = part else { return None };
    if pe.operation.is_some() {
        return None;
    }
    match pe.parameter.as_str() {
        "@" => {
            let params = get_positional_params(state);
            if !quoted {
                // Unquoted $@ splits on IFS same as $*; approximate by
                // treating each positional param as already split.
                return Some(params);
            }
            Some(params)
        }
        "*" => {
            let params = get_positional_params(state);
            let ifs_sep = crate::interpreter::helpers::get_ifs_separator(&state.env);
            Some(vec![params.join(ifs_sep)])
        }
        name => {
            let re = regex_lite::Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)\[([@*])\]$").unwrap();
            let caps = re.captures(name)?;
            let array_name = caps.get(1)?.as_str();
            let star = caps.get(2)?.as_str() == "*";
            let elements = get_array_elements(state, array_name);
            if elements.is_empty() {
                return Some(vec![]);
            }
            if star {
                let ifs_sep = crate::interpreter::helpers::get_ifs_separator(&state.env);
                let joined = elements.into_iter().map(|(_, v)| v).collect::<Vec<_>>().join(ifs_sep);
                Some(vec![joined])
            } else {
                Some(elements.into_iter().map(|(_, v)| v).collect())
            }
        }
    }
}

/// Expand a single word part to its scalar string value, threading command
/// substitution through `exec_script` and mutating `state` for side-effecting
/// operations (`${VAR:=default}`, arithmetic with assignment).
fn expand_part(
    state: &mut InterpreterState,
    part: &WordPart,
    in_double_quotes: bool,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    use crate::interpreter::helpers::word_parts::get_literal_value;

    if let Some(literal) = get_literal_value(part) {
        return WordExpansionResult::simple(literal.to_string());
    }

    match part {
        WordPart::TildeExpansion(tilde) => {
            if in_double_quotes {
                let s = match &tilde.user {
                    Some(u) => format!("~{}", u),
                    None => "~".to_string(),
                };
                return WordExpansionResult::simple(s);
            }
            let tilde_str = match &tilde.user {
                Some(u) => format!("~{}", u),
                None => "~".to_string(),
            };
            WordExpansionResult::simple(apply_tilde_expansion(state, &tilde_str))
        }
        WordPart::ParameterExpansion(param) => {
            expand_parameter(state, param, in_double_quotes, exec_script)
        }
        WordPart::DoubleQuoted(dq) => {
            let mut out = WordExpansionResult::simple(String::new());
            for inner_part in &dq.parts {
                let r = expand_part(state, inner_part, true, exec_script);
                out.value.push_str(&r.value);
                out.stderr.push_str(&r.stderr);
                if r.exit_code.is_some() {
                    out.exit_code = r.exit_code;
                }
            }
            out
        }
        WordPart::CommandSubstitution(cs) => expand_command_substitution(state, cs, exec_script),
        WordPart::ArithmeticExpansion(arith) => {
            let limits = ExecutionLimits::default();
            let mut ctx = InterpreterContext::new(state, &limits);
            match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                Ok(value) => WordExpansionResult::simple(value.to_string()),
                Err(e) => {
                    let mut r = WordExpansionResult::simple("0".to_string());
                    r.stderr = format!("bash: {}\n", e);
                    r.exit_code = Some(1);
                    r
                }
            }
        }
        WordPart::Glob(glob) => WordExpansionResult::simple(glob.pattern.clone()),
        WordPart::BraceExpansion(be) => {
            // A brace part reaching here means it sits beside other parts
            // that already went through brace_expand_word's cartesian
            // product for this very part; if it's still here it's nested
            // in a context (e.g. a parameter default value) that does not
            // itself brace-expand. Render the first alternative literally.
            if let Some(first) = be.items.first() {
                return WordExpansionResult::simple(render_first_brace_item(first));
            }
            WordExpansionResult::simple(String::new())
        }
        WordPart::ProcessSubstitution(_) => {
            // Process substitution needs a real fd/fifo from the executor;
            // left to the executor layer (SPEC_FULL.md executor module).
            WordExpansionResult::simple(String::new())
        }
        _ => WordExpansionResult::simple(String::new()),
    }
}

fn render_first_brace_item(item: &BraceItem) -> String {
    match item {
        BraceItem::Word { word } => {
            word.parts.iter().filter_map(crate::interpreter::helpers::word_parts::get_literal_value).collect()
        }
        BraceItem::Range { start_str, start, .. } => {
            start_str.clone().unwrap_or_else(|| start.to_string())
        }
    }
}

fn expand_command_substitution(
    state: &mut InterpreterState,
    cs: &crate::ast::types::CommandSubstitutionPart,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    use crate::interpreter::expansion::command_substitution::get_file_read_shorthand;

    if let Some(file_word) = get_file_read_shorthand(&cs.body) {
        let expanded_path = expand_word_no_glob(state, file_word, exec_script);
        return match std::fs::read_to_string(&expanded_path.value) {
            Ok(contents) => WordExpansionResult::simple(strip_trailing_newlines(&contents)),
            Err(e) => {
                let mut r = WordExpansionResult::simple(String::new());
                r.stderr = format!("bash: {}: {}\n", expanded_path.value, e);
                r.exit_code = Some(1);
                r
            }
        };
    }

    // Command substitutions run in a conceptual subshell: variable and
    // directory changes made inside do not escape back to the caller.
    let mut sub_state = state.clone();
    let exec_result = exec_script(&cs.body, &mut sub_state);
    let mut out = WordExpansionResult::simple(strip_trailing_newlines(&exec_result.stdout));
    out.stderr = exec_result.stderr;
    out.exit_code = Some(exec_result.exit_code);
    out
}

fn strip_trailing_newlines(s: &str) -> String {
    s.trim_end_matches('\n').to_string()
}

fn expand_parameter(
    state: &mut InterpreterState,
    param: &ParameterExpansionPart,
    in_double_quotes: bool,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    let Some(op) = &param.operation else {
        return WordExpansionResult::simple(get_variable(state, &param.parameter));
    };

    match op {
        ParameterOperation::Inner(inner) => {
            expand_inner_operation(state, &param.parameter, inner, in_double_quotes, exec_script)
        }
        ParameterOperation::Indirection(ind) => expand_indirection(state, &param.parameter, ind),
        ParameterOperation::ArrayKeys(ArrayKeysOp { array, star }) => {
            let keys = get_array_keys(state, array, *star);
            WordExpansionResult::simple(keys.join(" "))
        }
        ParameterOperation::VarNamePrefix(VarNamePrefixOp { prefix, star }) => {
            let names = get_var_names_with_prefix_op(state, prefix, *star);
            WordExpansionResult::simple(names.join(" "))
        }
    }
}

fn expand_indirection(state: &InterpreterState, parameter: &str, _ind: &IndirectionOp) -> WordExpansionResult {
    // Indirection combined with a further operation on the referenced
    // variable (`${!ref:-default}` style) is left at plain-reference
    // fidelity rather than fully threading the inner op through.
    if let Some(result) = expand_indirect_array(state, parameter) {
        let ifs_sep = if result.values.len() > 1 { " " } else { "" };
        return WordExpansionResult::simple(result.values.join(ifs_sep));
    }
    let target = get_variable(state, parameter);
    WordExpansionResult::simple(get_variable(state, &target))
}

fn expand_inner_operation(
    state: &mut InterpreterState,
    parameter: &str,
    op: &InnerParameterOperation,
    in_double_quotes: bool,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    match op {
        InnerParameterOperation::Length(_) => {
            WordExpansionResult::simple(get_parameter_length(state, parameter).to_string())
        }
        InnerParameterOperation::LengthSliceError(_) => {
            let mut r = WordExpansionResult::simple(String::new());
            r.stderr = format!("bash: ${{#{}: }}: bad substitution\n", parameter);
            r.exit_code = Some(1);
            r
        }
        InnerParameterOperation::BadSubstitution(bad) => {
            let mut r = WordExpansionResult::simple(String::new());
            r.stderr = format!("bash: {}: bad substitution\n", bad.text);
            r.exit_code = Some(1);
            r
        }
        InnerParameterOperation::DefaultValue(dv) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, dv.check_empty) {
                expand_word_no_glob(state, &dv.word, exec_script)
            } else {
                WordExpansionResult::simple(ctx.value)
            }
        }
        InnerParameterOperation::AssignDefault(ad) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, ad.check_empty) {
                let expanded = expand_word_no_glob(state, &ad.word, exec_script);
                set_scalar_variable(state, parameter, &expanded.value);
                expanded
            } else {
                WordExpansionResult::simple(ctx.value)
            }
        }
        InnerParameterOperation::ErrorIfUnset(eiu) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, eiu.check_empty) {
                let message = match &eiu.word {
                    Some(w) => expand_word_no_glob(state, w, exec_script).value,
                    None => "parameter null or not set".to_string(),
                };
                let mut r = WordExpansionResult::simple(String::new());
                r.stderr = format!("bash: {}: {}\n", parameter, message);
                r.exit_code = Some(1);
                r
            } else {
                WordExpansionResult::simple(ctx.value)
            }
        }
        InnerParameterOperation::UseAlternative(UseAlternativeOp { word, check_empty }) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_alternative(&ctx, *check_empty) {
                expand_word_no_glob(state, word, exec_script)
            } else {
                WordExpansionResult::simple(String::new())
            }
        }
        InnerParameterOperation::Substring(SubstringOp { offset, length }) => {
            expand_substring(state, parameter, offset, length.as_ref())
        }
        InnerParameterOperation::PatternRemoval(PatternRemovalOp { pattern, side, greedy }) => {
            expand_pattern_removal(state, parameter, pattern, *side, *greedy, exec_script)
        }
        InnerParameterOperation::PatternReplacement(pr) => {
            expand_pattern_replacement(state, parameter, pr, exec_script)
        }
        InnerParameterOperation::CaseModification(cm) => expand_case_modification(state, parameter, cm),
        InnerParameterOperation::Transform(TransformOp { operator }) => {
            let value = get_variable(state, parameter);
            let op_str = transform_operator_str(*operator);
            WordExpansionResult::simple(apply_transform_op(state, parameter, &value, op_str))
        }
    }
}

fn transform_operator_str(op: crate::ast::types::TransformOperator) -> &'static str {
    use crate::ast::types::TransformOperator::*;
    match op {
        Q => "Q",
        P => "P",
        A => "a",
        LowerA => "a",
        E => "E",
        K => "K",
        LowerK => "k",
        LowerU => "u",
        U => "U",
        L => "L",
    }
}

fn set_scalar_variable(state: &mut InterpreterState, name: &str, value: &str) {
    state.env.insert(name.to_string(), value.to_string());
}

fn expand_substring(
    state: &mut InterpreterState,
    parameter: &str,
    offset: &crate::ast::types::ArithmeticExpressionNode,
    length: Option<&crate::ast::types::ArithmeticExpressionNode>,
) -> WordExpansionResult {
    let limits = ExecutionLimits::default();
    let offset_val = {
        let mut ctx = InterpreterContext::new(state, &limits);
        evaluate_arithmetic(&mut ctx, &offset.expression, false, None).unwrap_or(0)
    };
    let length_val = length.map(|l| {
        let mut ctx = InterpreterContext::new(state, &limits);
        evaluate_arithmetic(&mut ctx, &l.expression, false, None).unwrap_or(0)
    });

    if parameter == "@" || parameter == "*" {
        use crate::interpreter::expansion::positional_params::apply_positional_slicing;
        match apply_positional_slicing(state, parameter == "*", offset_val, length_val) {
            Ok(r) => {
                let joined = if r.values.len() > 1 { r.values.join(" ") } else { r.values.join("") };
                WordExpansionResult::simple(joined)
            }
            Err(e) => {
                let mut r = WordExpansionResult::simple(String::new());
                r.stderr = format!("bash: {}\n", e);
                r.exit_code = Some(1);
                r
            }
        }
    } else {
        let value = get_variable(state, parameter);
        match apply_substring_op(&value, offset_val, length_val) {
            Ok(s) => WordExpansionResult::simple(s),
            Err(e) => {
                let mut r = WordExpansionResult::simple(String::new());
                r.stderr = format!("bash: {}: {}\n", parameter, e);
                r.exit_code = Some(1);
                r
            }
        }
    }
}

fn expand_pattern_removal(
    state: &mut InterpreterState,
    parameter: &str,
    pattern: &WordNode,
    side: AstPatternRemovalSide,
    greedy: bool,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    let pattern_str = expand_word_no_glob(state, pattern, exec_script).value;
    let regex_str = pattern_to_regex(&pattern_str, greedy, state.shopt_options.extglob);
    let side = match side {
        AstPatternRemovalSide::Prefix => crate::interpreter::expansion::PatternRemovalSide::Prefix,
        AstPatternRemovalSide::Suffix => crate::interpreter::expansion::PatternRemovalSide::Suffix,
    };

    if parameter == "@" || parameter == "*" {
        let r = apply_positional_pattern_removal(state, parameter == "*", "", "", &regex_str, side, greedy);
        let joined = if r.values.len() > 1 { r.values.join(" ") } else { r.values.join("") };
        return WordExpansionResult::simple(joined);
    }

    let value = get_variable(state, parameter);
    WordExpansionResult::simple(apply_pattern_removal_op(&value, &regex_str, side, greedy))
}

fn expand_pattern_replacement(
    state: &mut InterpreterState,
    parameter: &str,
    pr: &PatternReplacementOp,
    exec_script: &ExecuteScriptFn,
) -> WordExpansionResult {
    let pattern_str = expand_word_no_glob(state, &pr.pattern, exec_script).value;
    let replacement_str = match &pr.replacement {
        Some(w) => expand_word_no_glob(state, w, exec_script).value,
        None => String::new(),
    };
    let regex_str = pattern_to_regex(&pattern_str, pr.all, state.shopt_options.extglob);
    let anchor_start = matches!(pr.anchor, Some(PatternAnchor::Start));
    let anchor_end = matches!(pr.anchor, Some(PatternAnchor::End));

    if parameter == "@" || parameter == "*" {
        let r = apply_positional_pattern_replacement(
            state,
            parameter == "*",
            "",
            "",
            &regex_str,
            &replacement_str,
            pr.all,
            anchor_start,
            anchor_end,
        );
        let joined = if r.values.len() > 1 { r.values.join(" ") } else { r.values.join("") };
        return WordExpansionResult::simple(joined);
    }

    let value = get_variable(state, parameter);
    WordExpansionResult::simple(apply_pattern_replacement_op(
        &value,
        &regex_str,
        &replacement_str,
        pr.all,
        anchor_start,
        anchor_end,
    ))
}

fn expand_case_modification(
    state: &InterpreterState,
    parameter: &str,
    cm: &CaseModificationOp,
) -> WordExpansionResult {
    let value = get_variable(state, parameter);
    let op_str = match (cm.direction, cm.all) {
        (CaseDirection::Upper, true) => "U",
        (CaseDirection::Upper, false) => "u",
        (CaseDirection::Lower, true) => "L",
        (CaseDirection::Lower, false) => "l",
    };
    // `cm.pattern` (limiting which characters get modified) is a rare extra
    // refinement on top of the basic ^ / ^^ / , / ,, forms; apply to the
    // whole value, matching this crate's other simplified pattern handling.
    WordExpansionResult::simple(apply_case_modification(&value, op_str))
}

/// Expand a `BraceExpansionPart`'s items into a list of literal alternatives,
/// each a sequence of `WordPart`s that replace the brace part in-place.
fn brace_item_alternatives(items: &[BraceItem]) -> Vec<Vec<WordPart>> {
    let mut alts = Vec::new();
    for item in items {
        match item {
            BraceItem::Word { word } => alts.push(word.parts.clone()),
            BraceItem::Range { start, end, step, start_str, end_str } => {
                use crate::ast::types::BraceRangeValue;
                use crate::interpreter::expansion::brace_range::{expand_brace_range, RangeValue};
                let start_rv = match start {
                    BraceRangeValue::Number(n) => RangeValue::Numeric(*n),
                    BraceRangeValue::Char(c) => RangeValue::Char(*c),
                };
                let end_rv = match end {
                    BraceRangeValue::Number(n) => RangeValue::Numeric(*n),
                    BraceRangeValue::Char(c) => RangeValue::Char(*c),
                };
                match expand_brace_range(start_rv, end_rv, *step, start_str.as_deref(), end_str.as_deref()) {
                    Ok(result) => {
                        if let Some(values) = result.expanded {
                            for v in values {
                                alts.push(vec![WordPart::Literal(crate::ast::types::LiteralPart { value: v })]);
                            }
                        } else {
                            alts.push(vec![WordPart::Literal(crate::ast::types::LiteralPart {
                                value: result.literal,
                            })]);
                        }
                    }
                    Err(_) => {
                        alts.push(vec![WordPart::Literal(crate::ast::types::LiteralPart {
                            value: format!("{{{}..{}}}", start, end),
                        })]);
                    }
                }
            }
        }
    }
    alts
}

/// Expand brace expressions in a word into the cartesian product of all
/// their alternatives, recursing so nested/multiple brace groups compose.
/// Returns `vec![word.clone()]` unchanged if the word has no brace parts.
pub fn brace_expand_word(word: &WordNode) -> Vec<WordNode> {
    let Some(idx) = word.parts.iter().position(|p| matches!(p, WordPart::BraceExpansion(_))) else {
        return vec![word.clone()];
    };
    let WordPart::BraceExpansion(be) = &word.parts[idx] else { unreachable!() };
    if be.items.len() < 2 {
        // A lone {word} with no comma/range is not an expansion; leave it as
        // literal braces around its rendered content.
        let rendered = render_first_brace_item(be.items.first().unwrap_or(&BraceItem::Word {
            word: WordNode { parts: vec![] },
        }));
        let mut parts = word.parts.clone();
        parts[idx] = WordPart::Literal(crate::ast::types::LiteralPart {
            value: format!("{{{}}}", rendered),
        });
        return brace_expand_word(&WordNode { parts });
    }

    let mut out = Vec::new();
    for alt in brace_item_alternatives(&be.items) {
        let mut new_parts = word.parts[..idx].to_vec();
        new_parts.extend(alt);
        new_parts.extend(word.parts[idx + 1..].to_vec());
        out.extend(brace_expand_word(&WordNode { parts: new_parts }));
    }
    out
}

/// Check if a word is "fully quoted" - meaning glob characters should be treated literally.
///
/// A word is fully quoted if all its parts are either:
/// - SingleQuoted
/// - DoubleQuoted (entirely quoted variable expansion like "$pat")
/// - Escaped characters
pub fn is_word_fully_quoted(word: &WordNode) -> bool {
    use crate::interpreter::helpers::word_parts::is_quoted_part;

    // Empty word is considered quoted (matches empty pattern literally)
    if word.parts.is_empty() {
        return true;
    }

    // Check if we have any unquoted parts with actual content
    for part in &word.parts {
        if !is_quoted_part(part) {
            return false;
        }
    }
    true
}

/// Check if a word contains any glob patterns.
pub fn word_has_glob_pattern(word: &WordNode, extglob: bool) -> bool {
    use crate::interpreter::expansion::glob_escape::has_glob_pattern;

    for part in &word.parts {
        match part {
            WordPart::Glob(_) => return true,
            WordPart::Literal(lit) => {
                if has_glob_pattern(&lit.value, extglob) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Check if a word contains command substitution.
pub fn word_has_command_substitution(word: &WordNode) -> bool {
    for part in &word.parts {
        if matches!(part, WordPart::CommandSubstitution(_)) {
            return true;
        }
        if let WordPart::DoubleQuoted(dq) = part {
            for inner in &dq.parts {
                if matches!(inner, WordPart::CommandSubstitution(_)) {
                    return true;
                }
            }
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{CommandSubstitutionPart, GlobPart, LiteralPart, SingleQuotedPart};

    fn no_exec() -> ExecuteScriptFn {
        Box::new(|_script: &ScriptNode, _state: &mut InterpreterState| ExecResult::ok())
    }

    fn make_literal_word(s: &str) -> WordNode {
        WordNode { parts: vec![WordPart::Literal(LiteralPart { value: s.to_string() })] }
    }

    fn make_var_word(name: &str) -> WordNode {
        WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: name.to_string(),
                operation: None,
            })],
        }
    }

    #[test]
    fn test_expand_word_literal() {
        let mut state = InterpreterState::default();
        let word = make_literal_word("hello");
        let exec = no_exec();
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "hello");
    }

    #[test]
    fn test_expand_word_variable() {
        let mut state = InterpreterState::default();
        state.env.insert("FOO".to_string(), "bar".to_string());
        let word = make_var_word("FOO");
        let exec = no_exec();
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "bar");
    }

    #[test]
    fn test_expand_word_unset_variable() {
        let mut state = InterpreterState::default();
        let word = make_var_word("UNSET");
        let exec = no_exec();
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "");
    }

    #[test]
    fn test_default_value_operation() {
        let mut state = InterpreterState::default();
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "UNSET".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::DefaultValue(
                    crate::ast::types::DefaultValueOp { word: make_literal_word("fallback"), check_empty: true },
                ))),
            })],
        };
        let exec = no_exec();
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "fallback");
    }

    #[test]
    fn test_assign_default_mutates_state() {
        let mut state = InterpreterState::default();
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "X".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::AssignDefault(
                    crate::ast::types::AssignDefaultOp { word: make_literal_word("val"), check_empty: true },
                ))),
            })],
        };
        let exec = no_exec();
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "val");
        assert_eq!(state.env.get("X").map(|s| s.as_str()), Some("val"));
    }

    fn brace_word_list(alts: &[&str]) -> WordPart {
        use crate::ast::types::BraceExpansionPart;
        WordPart::BraceExpansion(BraceExpansionPart {
            items: alts
                .iter()
                .map(|s| BraceItem::Word { word: make_literal_word(s) })
                .collect(),
        })
    }

    #[test]
    fn test_brace_expand_simple() {
        let word = WordNode { parts: vec![brace_word_list(&["a", "b", "c"])] };
        let expanded = brace_expand_word(&word);
        assert_eq!(expanded.len(), 3);
    }

    #[test]
    fn test_brace_expand_with_surrounding_literals() {
        let word = WordNode {
            parts: vec![
                WordPart::Literal(LiteralPart { value: "x".to_string() }),
                brace_word_list(&["1", "2"]),
                WordPart::Literal(LiteralPart { value: "y".to_string() }),
            ],
        };
        let expanded = brace_expand_word(&word);
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn test_command_substitution_uses_callback() {
        let mut state = InterpreterState::default();
        let word = WordNode {
            parts: vec![WordPart::CommandSubstitution(CommandSubstitutionPart {
                body: ScriptNode { statements: vec![] },
                legacy: false,
            })],
        };
        let exec: ExecuteScriptFn = Box::new(|_script, _state| {
            let mut r = ExecResult::ok();
            r.stdout = "hi\n".to_string();
            r
        });
        let result = expand_word_no_glob(&mut state, &word, &exec);
        assert_eq!(result.value, "hi");
    }

    #[test]
    fn test_is_word_fully_quoted_empty() {
        let word = WordNode { parts: vec![] };
        assert!(is_word_fully_quoted(&word));
    }

    #[test]
    fn test_is_word_fully_quoted_single_quoted() {
        let word = WordNode { parts: vec![WordPart::SingleQuoted(SingleQuotedPart { value: "hello".to_string() })] };
        assert!(is_word_fully_quoted(&word));
    }

    #[test]
    fn test_is_word_fully_quoted_literal() {
        let word = make_literal_word("hello");
        assert!(!is_word_fully_quoted(&word));
    }

    #[test]
    fn test_word_has_glob_pattern() {
        let word = WordNode { parts: vec![WordPart::Glob(GlobPart { pattern: "*.txt".to_string() })] };
        assert!(word_has_glob_pattern(&word, false));

        let word = make_literal_word("hello");
        assert!(!word_has_glob_pattern(&word, false));
    }

    #[test]
    fn test_word_has_command_substitution() {
        let word = WordNode {
            parts: vec![WordPart::CommandSubstitution(CommandSubstitutionPart {
                body: ScriptNode { statements: vec![] },
                legacy: false,
            })],
        };
        assert!(word_has_command_substitution(&word));

        let word = make_literal_word("hello");
        assert!(!word_has_command_substitution(&word));
    }

    #[test]
    fn test_split_on_unquoted_variable() {
        let mut state = InterpreterState::default();
        state.env.insert("X".to_string(), "a b c".to_string());
        let word = make_var_word("X");
        let exec = no_exec();
        let mut result = ArgumentExpansionResult::default();
        let words = expand_one_braced_word(&mut state, &word, &exec, &mut result);
        assert_eq!(words, vec!["a", "b", "c"]);
    }
}
