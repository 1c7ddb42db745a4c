//! Target and macro name character-set validation.
//!
//! Grounded on `input.c`'s `is_valid_target` and `macro.c`'s inline
//! `isspace`/`=` check inside `setmacro`. See spec.md §4.1: POSIX 2017
//! permits `[A-Za-z0-9._]`, POSIX 2024 additionally allows `[-/]`, and the
//! `target_name` pragma lifts the restriction to any character but `=`.

use crate::pragma::{Pragma, Standard};

/// Whether `name` is a syntactically valid target (or prerequisite) name
/// under the given standard/pragma combination. An empty name is never
/// valid.
pub fn validate_target_name(name: &str, standard: Standard, pragma: &Pragma) -> bool {
    if name.is_empty() {
        return false;
    }
    if pragma.target_name {
        return !name.contains('=');
    }
    let extra: &[char] = match standard {
        Standard::Posix2017 => &[],
        Standard::Posix2024 | Standard::Extended => &['-', '/'],
    };
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || extra.contains(&c))
}

/// Whether `name` is a valid macro identifier: no `=` and no whitespace,
/// matching `setmacro`'s inline check. The `macro_name` pragma has no
/// bearing on the character set itself (it only governs whether bare
/// `$X` references are accepted elsewhere) so it isn't consulted here.
pub fn validate_macro_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c == '=' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix2017_rejects_hyphen() {
        assert!(!validate_target_name("foo-bar", Standard::Posix2017, &Pragma::default()));
        assert!(validate_target_name("foo-bar", Standard::Extended, &Pragma::default()));
    }

    #[test]
    fn target_name_pragma_allows_almost_anything() {
        let mut p = Pragma::default();
        p.target_name = true;
        assert!(validate_target_name("foo+bar!", Standard::Posix2017, &p));
        assert!(!validate_target_name("foo=bar", Standard::Posix2017, &p));
    }

    #[test]
    fn macro_names_reject_blanks_and_equals() {
        assert!(validate_macro_name("CFLAGS"));
        assert!(!validate_macro_name("CC FLAGS"));
        assert!(!validate_macro_name("A=B"));
    }
}
