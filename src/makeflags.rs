//! `MAKEFLAGS` environment variable: parsing on entry, rewriting on exit.
//!
//! Grounded on `main.c`'s `expand_makeflags`/`update_makeflags`. Treated
//! as its own module because, in shape, it behaves like a configuration
//! layer even though spec.md never names it as one (SPEC_FULL.md §2.3).

use crate::error::MakeError;
use crate::symtab::MacroTable;

/// Option letters that participate in `MAKEFLAGS` bundling, in the
/// original's `OPTSTR1` order. `-f`/`-p`/`-S`/`-C` are deliberately
/// excluded, matching `update_makeflags`.
const BUNDLED_OPT_LETTERS: &str = "eiknqrst";

/// All option letters `getopt`-style parsing must accept, including the
/// ones excluded from bundling.
pub const ALL_OPT_LETTERS: &str = "ef:iknpqrsSt";

/// Split the contents of `MAKEFLAGS` into argv-style tokens, the way
/// `expand_makeflags` does: if the value doesn't start with `-`, doesn't
/// contain `=`, and consists only of valid option characters, a leading
/// `-` is synthesized; otherwise it's split on unescaped blanks (`\`
/// escapes the following character).
pub fn split_makeflags(makeflags: &str) -> Result<Vec<String>, MakeError> {
    let trimmed = makeflags.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut prefix = String::new();
    if !trimmed.starts_with('-') && !trimmed.contains('=') {
        if !trimmed.chars().all(|c| BUNDLED_OPT_LETTERS.contains(c)) {
            return Err(MakeError::InvalidMakeflags);
        }
        prefix.push('-');
    }

    let mut tokens = Vec::new();
    let mut current = prefix;
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Re-derive the bundled option string (e.g. `-kn`) plus `NAME=value`
/// words for every level-1 (command line) and level-2 (inherited
/// MAKEFLAGS) macro, escaping backslashes and blanks in each value. Level
/// 1 macros other than `SHELL` are also exported into the process
/// environment by the caller. Returns `None` when there is nothing to
/// report (no options set, no qualifying macros).
pub fn encode_makeflags(active_letters: &str, macros: &MacroTable) -> Option<String> {
    let mut out = String::new();
    if !active_letters.is_empty() {
        out.push('-');
        out.push_str(active_letters);
    }

    for m in macros.iter() {
        if (m.level == 1 || m.level == 2) && m.name != "MAKEFLAGS" {
            let mut word = String::new();
            word.push_str(&m.name);
            word.push('=');
            for c in m.value.chars() {
                if c == '\\' || c.is_whitespace() {
                    word.push('\\');
                }
                word.push(c);
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&word);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_letters_get_synthesized_dash() {
        let tokens = split_makeflags("kn").unwrap();
        assert_eq!(tokens, vec!["-kn".to_string()]);
    }

    #[test]
    fn macro_assignment_forces_no_dash() {
        let tokens = split_makeflags("CC=gcc -k").unwrap();
        assert_eq!(tokens, vec!["CC=gcc".to_string(), "-k".to_string()]);
    }

    #[test]
    fn backslash_escapes_blank_inside_token() {
        let tokens = split_makeflags("FOO=a\\ b").unwrap();
        assert_eq!(tokens, vec!["FOO=a b".to_string()]);
    }

    #[test]
    fn invalid_bare_letters_are_rejected() {
        assert!(split_makeflags("zz").is_err());
    }
}
