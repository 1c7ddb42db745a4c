use crate::error::MakeError;

use super::wildcard::{expand_wildcards, tokenize_archive_aware};

/// A rule line split into its parts, before any macro expansion of the
/// prerequisite list or target names has happened (callers expand the
/// macro-bearing parts first, then call `parse_rule_line` on the
/// expanded text).
#[derive(Debug, Clone)]
pub struct ParsedRuleLine {
    pub targets: Vec<String>,
    pub double_colon: bool,
    pub prereqs: Vec<String>,
    pub inline_cmd: Option<String>,
}

/// Split an already-expanded rule line (`targets: prereqs [; command]` or
/// `targets:: prereqs [; command]`) into its parts. Grounded on
/// `input.c`'s `find_colon` + the target/prerequisite parsing in
/// `input()`.
pub fn parse_rule_line(text: &str) -> Result<ParsedRuleLine, MakeError> {
    let colon = find_top_level_colon(text).ok_or(MakeError::ExpectedSeparator)?;
    let before = &text[..colon];
    let mut after_start = colon + 1;
    let double_colon = text.as_bytes().get(after_start) == Some(&b':');
    if double_colon {
        after_start += 1;
    }
    let after = &text[after_start..];

    let (prereq_part, inline_cmd) = split_inline_command(after);

    let targets = expand_wildcards(tokenize_archive_aware(before));
    if targets.is_empty() {
        return Err(MakeError::Unexpected("rule with no target".to_string()));
    }
    let prereqs = expand_wildcards(tokenize_archive_aware(&prereq_part));

    Ok(ParsedRuleLine {
        targets,
        double_colon,
        prereqs,
        inline_cmd,
    })
}

fn find_top_level_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if i + 1 < bytes.len() && (bytes[i + 1] == b'(' || bytes[i + 1] == b'{') => {
                depth += 1;
                i += 1;
            }
            b')' | b'}' if depth > 0 => depth -= 1,
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split at the first top-level `;`, which separates the prerequisite
/// list from an inline command on the same physical line.
fn split_inline_command(after: &str) -> (String, Option<String>) {
    let bytes = after.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if i + 1 < bytes.len() && (bytes[i + 1] == b'(' || bytes[i + 1] == b'{') => {
                depth += 1;
                i += 1;
            }
            b')' | b'}' if depth > 0 => depth -= 1,
            b';' if depth == 0 => {
                return (
                    after[..i].to_string(),
                    Some(after[i + 1..].trim_start().to_string()),
                );
            }
            _ => {}
        }
        i += 1;
    }
    (after.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_rule() {
        let r = parse_rule_line("foo.o: foo.c foo.h").unwrap();
        assert_eq!(r.targets, vec!["foo.o"]);
        assert!(!r.double_colon);
        assert_eq!(r.prereqs, vec!["foo.c", "foo.h"]);
        assert!(r.inline_cmd.is_none());
    }

    #[test]
    fn double_colon_rule() {
        let r = parse_rule_line("foo.o:: foo.c").unwrap();
        assert!(r.double_colon);
    }

    #[test]
    fn inline_command_after_semicolon() {
        let r = parse_rule_line("foo: bar; echo hi").unwrap();
        assert_eq!(r.prereqs, vec!["bar"]);
        assert_eq!(r.inline_cmd.as_deref(), Some("echo hi"));
    }

    #[test]
    fn missing_colon_is_an_error() {
        assert!(parse_rule_line("foo bar baz").is_err());
    }
}
