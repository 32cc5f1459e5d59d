//! Pathname (glob) expansion over the real filesystem.
//!
//! Walks directories with `std::fs::read_dir`, matching each path segment
//! against a glob-to-regex translation from [`super::glob_translate`].
//! Supports `globstar` (`**` crossing `/`), `dotglob`, `nullglob`,
//! `failglob`, `extglob` and `GLOBIGNORE`, mirroring bash's pathname
//! expansion rules.

use crate::interpreter::expansion::glob_translate::{
    globignore_pattern_to_regex, glob_to_regex, split_globignore_patterns,
};
use crate::interpreter::expansion::{has_glob_pattern, unescape_glob_pattern};
use std::path::{Path, PathBuf};

/// Result of glob expansion.
#[derive(Debug, Clone)]
pub struct GlobExpansionResult {
    /// The expanded values (file paths or original pattern if no match)
    pub values: Vec<String>,
    /// Whether the result should be treated as quoted (no further splitting)
    pub quoted: bool,
}

/// Options governing how a pattern is walked against the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobWalkOptions {
    pub globstar: bool,
    pub dotglob: bool,
    pub extglob: bool,
    pub globskipdots: bool,
}

/// Expand a glob pattern to matching file paths.
///
/// If no matches are found, returns the original pattern (with glob escapes
/// removed). If `failglob` is set and there are no matches, returns an
/// error; if `nullglob` is set instead, returns an empty result.
pub fn expand_glob_pattern(
    pattern: &str,
    cwd: &Path,
    failglob: bool,
    nullglob: bool,
    extglob: bool,
) -> Result<GlobExpansionResult, String> {
    expand_glob_pattern_with(
        pattern,
        cwd,
        failglob,
        nullglob,
        GlobWalkOptions { globstar: false, dotglob: false, extglob, globskipdots: true },
        None,
    )
}

/// Full-featured glob expansion, honoring `globstar`/`dotglob`/`GLOBIGNORE`
/// in addition to `failglob`/`nullglob`/`extglob`.
pub fn expand_glob_pattern_with(
    pattern: &str,
    cwd: &Path,
    failglob: bool,
    nullglob: bool,
    options: GlobWalkOptions,
    globignore: Option<&str>,
) -> Result<GlobExpansionResult, String> {
    if !has_glob_pattern(pattern, options.extglob) {
        return Ok(GlobExpansionResult {
            values: vec![unescape_glob_pattern(pattern)],
            quoted: false,
        });
    }

    let globignore_patterns = globignore
        .filter(|g| !g.is_empty())
        .map(split_globignore_patterns)
        .unwrap_or_default();
    let has_globignore = !globignore_patterns.is_empty();
    let effective_dotglob = options.dotglob || has_globignore;

    let mut matches = walk_pattern(pattern, cwd, options, effective_dotglob);
    matches = filter_globignore(matches, &globignore_patterns, has_globignore, options.globskipdots);
    matches.sort();
    matches.dedup();

    if matches.is_empty() {
        if failglob {
            return Err(format!("no match: {}", pattern));
        }
        if nullglob {
            return Ok(GlobExpansionResult { values: vec![], quoted: false });
        }
        return Ok(GlobExpansionResult {
            values: vec![unescape_glob_pattern(pattern)],
            quoted: false,
        });
    }

    Ok(GlobExpansionResult { values: matches, quoted: false })
}

fn filter_globignore(
    results: Vec<String>,
    globignore_patterns: &[String],
    has_globignore: bool,
    globskipdots: bool,
) -> Vec<String> {
    if !has_globignore && !globskipdots {
        return results;
    }
    results
        .into_iter()
        .filter(|path| {
            let basename = path.rsplit('/').next().unwrap_or(path);
            if (has_globignore || globskipdots) && (basename == "." || basename == "..") {
                return false;
            }
            if has_globignore {
                for ignore_pattern in globignore_patterns {
                    let regex_str = globignore_pattern_to_regex(ignore_pattern);
                    if let Ok(re) = regex_lite::Regex::new(&regex_str) {
                        if re.is_match(path) {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .collect()
}

fn match_pattern(name: &str, pattern: &str, extglob: bool) -> bool {
    let regex_str = glob_to_regex(pattern, extglob);
    regex_lite::Regex::new(&regex_str).map(|re| re.is_match(name)).unwrap_or(false)
}

fn has_glob_chars(s: &str, extglob: bool) -> bool {
    has_glob_pattern(s, extglob)
}

/// `**` is only treated as globstar when it occupies a whole path segment.
fn is_globstar_valid(pattern: &str) -> bool {
    pattern.split('/').all(|seg| !seg.contains("**") || seg == "**")
}

fn walk_pattern(pattern: &str, cwd: &Path, options: GlobWalkOptions, effective_dotglob: bool) -> Vec<String> {
    if pattern.contains("**") && options.globstar && is_globstar_valid(pattern) {
        expand_recursive(pattern, cwd, options, effective_dotglob)
    } else {
        let normalized = pattern.replace("**", "*");
        expand_simple(&normalized, cwd, options, effective_dotglob)
    }
}

fn resolve_base(cwd: &Path, base: &str) -> PathBuf {
    if base.is_empty() { cwd.to_path_buf() } else { cwd.join(base) }
}

fn expand_simple(pattern: &str, cwd: &Path, options: GlobWalkOptions, dotglob: bool) -> Vec<String> {
    let is_absolute = pattern.starts_with('/');
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

    let first_glob_idx = match segments.iter().position(|s| has_glob_chars(s, options.extglob)) {
        Some(idx) => idx,
        None => return vec![pattern.to_string()],
    };

    let (fs_base_path, result_prefix) = if first_glob_idx == 0 {
        if is_absolute {
            (PathBuf::from("/"), "/".to_string())
        } else {
            (cwd.to_path_buf(), String::new())
        }
    } else {
        let base = segments[..first_glob_idx].join("/");
        if is_absolute {
            (PathBuf::from(format!("/{}", base)), format!("/{}", base))
        } else {
            (resolve_base(cwd, &base), base)
        }
    };

    let remaining = &segments[first_glob_idx..];
    expand_segments(&fs_base_path, &result_prefix, remaining, options, dotglob)
}

fn expand_segments(
    fs_path: &Path,
    result_prefix: &str,
    segments: &[&str],
    options: GlobWalkOptions,
    dotglob: bool,
) -> Vec<String> {
    if segments.is_empty() {
        return vec![result_prefix.to_string()];
    }

    let current_segment = segments[0];
    let remaining = &segments[1..];
    let mut results = Vec::new();

    let entries = match std::fs::read_dir(fs_path) {
        Ok(e) => e,
        Err(_) => return results,
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with('.') && !current_segment.starts_with('.') && !dotglob {
            continue;
        }

        if !match_pattern(&name, current_segment, options.extglob) {
            continue;
        }

        let new_fs_path = fs_path.join(&name);
        let new_result_prefix = if result_prefix.is_empty() {
            name.clone()
        } else if result_prefix == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", result_prefix, name)
        };

        if remaining.is_empty() {
            results.push(new_result_prefix);
        } else if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            results.extend(expand_segments(&new_fs_path, &new_result_prefix, remaining, options, dotglob));
        }
    }

    results
}

fn expand_recursive(pattern: &str, cwd: &Path, options: GlobWalkOptions, dotglob: bool) -> Vec<String> {
    let double_star_idx = pattern.find("**").unwrap();
    let before = pattern[..double_star_idx].trim_end_matches('/');
    let before = if before.is_empty() { "." } else { before };
    let after = &pattern[double_star_idx + 2..];
    let file_pattern = after.trim_start_matches('/');

    if file_pattern.contains("**") && is_globstar_valid(file_pattern) {
        let mut results = Vec::new();
        walk_directory_multi_globstar(before, file_pattern, cwd, options, dotglob, &mut results);
        results.sort();
        results.dedup();
        return results;
    }

    let mut results = Vec::new();
    walk_directory(before, file_pattern, cwd, options, dotglob, &mut results);
    results
}

fn walk_directory(
    dir: &str,
    file_pattern: &str,
    cwd: &Path,
    options: GlobWalkOptions,
    dotglob: bool,
    results: &mut Vec<String>,
) {
    let full_path = resolve_base(cwd, dir);
    let entries = match std::fs::read_dir(&full_path) {
        Ok(e) => e,
        Err(_) => return,
    };

    let mut dirs = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') && !dotglob {
            continue;
        }
        let entry_path = if dir == "." { name.clone() } else { format!("{}/{}", dir, name) };

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            dirs.push(entry_path.clone());
        }

        if !file_pattern.is_empty() && match_pattern(&name, file_pattern, options.extglob) {
            results.push(entry_path);
        }
    }

    for dir_path in dirs {
        walk_directory(&dir_path, file_pattern, cwd, options, dotglob, results);
    }
}

fn walk_directory_multi_globstar(
    dir: &str,
    sub_pattern: &str,
    cwd: &Path,
    options: GlobWalkOptions,
    dotglob: bool,
    results: &mut Vec<String>,
) {
    let full_path = resolve_base(cwd, dir);
    let entries = match std::fs::read_dir(&full_path) {
        Ok(e) => e,
        Err(_) => return,
    };

    let mut dirs = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') && !dotglob {
            continue;
        }
        let entry_path = if dir == "." { name } else { format!("{}/{}", dir, name) };
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry_path);
        }
    }

    let pattern_from_here = if dir == "." { sub_pattern.to_string() } else { format!("{}/{}", dir, sub_pattern) };
    results.extend(expand_recursive(&pattern_from_here, cwd, options, dotglob));

    for dir_path in dirs {
        walk_directory_multi_globstar(&dir_path, sub_pattern, cwd, options, dotglob, results);
    }
}

/// Check if a word should be subject to glob expansion.
/// Returns false if the word is entirely quoted.
pub fn should_glob_expand(is_quoted: bool, noglob: bool) -> bool {
    !is_quoted && !noglob
}

/// Split a value by IFS and expand each resulting word as a glob pattern.
pub fn split_and_glob_expand(
    values: &[String],
    cwd: &Path,
    failglob: bool,
    nullglob: bool,
    noglob: bool,
    extglob: bool,
) -> Result<Vec<String>, String> {
    if noglob {
        return Ok(values.to_vec());
    }

    let mut result = Vec::new();
    for value in values {
        let expanded = expand_glob_pattern(value, cwd, failglob, nullglob, extglob)?;
        result.extend(expanded.values);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_should_glob_expand() {
        assert!(should_glob_expand(false, false));
        assert!(!should_glob_expand(true, false));
        assert!(!should_glob_expand(false, true));
        assert!(!should_glob_expand(true, true));
    }

    #[test]
    fn test_expand_glob_no_pattern() {
        let cwd = env::current_dir().unwrap();
        let result = expand_glob_pattern("hello", &cwd, false, false, false).unwrap();
        assert_eq!(result.values, vec!["hello"]);
    }

    #[test]
    fn test_expand_glob_escaped() {
        let cwd = env::current_dir().unwrap();
        let result = expand_glob_pattern("hello\\*world", &cwd, false, false, false).unwrap();
        assert_eq!(result.values, vec!["hello*world"]);
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_expand_star_matches_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "b.txt");
        touch(dir.path(), "c.rs");
        let result = expand_glob_pattern("*.txt", dir.path(), false, false, false).unwrap();
        assert_eq!(result.values, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_expand_star_excludes_hidden_without_dotglob() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".hidden");
        touch(dir.path(), "visible");
        let result = expand_glob_pattern("*", dir.path(), false, false, false).unwrap();
        assert_eq!(result.values, vec!["visible"]);
    }

    #[test]
    fn test_expand_dot_star_matches_hidden() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".hidden");
        touch(dir.path(), "visible");
        let result = expand_glob_pattern(".*", dir.path(), false, false, false).unwrap();
        assert!(result.values.iter().any(|v| v == ".hidden"));
        assert!(!result.values.iter().any(|v| v == "."));
        assert!(!result.values.iter().any(|v| v == ".."));
    }

    #[test]
    fn test_expand_with_dotglob() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".hidden");
        touch(dir.path(), "visible");
        let result = expand_glob_pattern_with(
            "*",
            dir.path(),
            false,
            false,
            GlobWalkOptions { globstar: false, dotglob: true, extglob: false, globskipdots: true },
            None,
        )
        .unwrap();
        assert!(result.values.contains(&"visible".to_string()));
        assert!(result.values.contains(&".hidden".to_string()));
    }

    #[test]
    fn test_expand_no_matches_returns_pattern() {
        let dir = tempdir().unwrap();
        let result = expand_glob_pattern("*.nomatch", dir.path(), false, false, false).unwrap();
        assert_eq!(result.values, vec!["*.nomatch"]);
    }

    #[test]
    fn test_expand_no_matches_with_nullglob() {
        let dir = tempdir().unwrap();
        let result = expand_glob_pattern("*.nomatch", dir.path(), false, true, false).unwrap();
        assert!(result.values.is_empty());
    }

    #[test]
    fn test_expand_no_matches_with_failglob() {
        let dir = tempdir().unwrap();
        let result = expand_glob_pattern("*.nomatch", dir.path(), true, false, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_subdir_pattern() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "inner.txt");
        let result = expand_glob_pattern("sub/*.txt", dir.path(), false, false, false).unwrap();
        assert_eq!(result.values, vec!["sub/inner.txt"]);
    }

    #[test]
    fn test_expand_recursive_globstar() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        touch(&dir.path().join("a/b"), "deep.txt");
        touch(dir.path(), "shallow.txt");
        let result = expand_glob_pattern_with(
            "**/*.txt",
            dir.path(),
            false,
            false,
            GlobWalkOptions { globstar: true, dotglob: false, extglob: false, globskipdots: true },
            None,
        )
        .unwrap();
        assert!(result.values.contains(&"shallow.txt".to_string()));
        assert!(result.values.contains(&"a/b/deep.txt".to_string()));
    }

    #[test]
    fn test_expand_results_are_sorted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "z.txt");
        touch(dir.path(), "a.txt");
        touch(dir.path(), "m.txt");
        let result = expand_glob_pattern("*.txt", dir.path(), false, false, false).unwrap();
        assert_eq!(result.values, vec!["a.txt", "m.txt", "z.txt"]);
    }

    #[test]
    fn test_expand_with_globignore() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "keep.txt");
        touch(dir.path(), "ignore.log");
        let result = expand_glob_pattern_with(
            "*",
            dir.path(),
            false,
            false,
            GlobWalkOptions { globstar: false, dotglob: false, extglob: false, globskipdots: true },
            Some("*.log"),
        )
        .unwrap();
        assert_eq!(result.values, vec!["keep.txt"]);
    }

    #[test]
    fn test_expand_extglob_pattern() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "foo.txt");
        touch(dir.path(), "bar.txt");
        touch(dir.path(), "baz.txt");
        let result = expand_glob_pattern_with(
            "@(foo|bar).txt",
            dir.path(),
            false,
            false,
            GlobWalkOptions { globstar: false, dotglob: false, extglob: true, globskipdots: true },
            None,
        )
        .unwrap();
        assert_eq!(result.values, vec!["bar.txt", "foo.txt"]);
    }
}
