//! Archive-member token rejoining and shell-style wildcard expansion for
//! target/prerequisite word lists.
//!
//! Grounded on `input.c`'s `wildcard` (glob expansion) and the
//! `lib(m1 m2)` archive-member spreading extension.

/// Split `s` on whitespace the way a rule's target/prerequisite list is
/// split, except that `name(member member ...)` is recognized as a unit
/// and expanded into one `name(member)` token per member, so prerequisite
/// lists can spread several archive members across one parenthesized
/// group (an Extended feature).
pub fn tokenize_archive_aware(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '(' {
            i += 1;
        }
        let head: String = chars[start..i].iter().collect();

        if i < chars.len() && chars[i] == '(' {
            i += 1;
            let mut depth = 1;
            let mut cur = String::new();
            let mut members = Vec::new();
            while i < chars.len() && depth > 0 {
                match chars[i] {
                    '(' => {
                        depth += 1;
                        cur.push('(');
                    }
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            if !cur.trim().is_empty() {
                                members.push(cur.trim().to_string());
                            }
                        } else {
                            cur.push(')');
                        }
                    }
                    c if c.is_whitespace() && depth == 1 => {
                        if !cur.trim().is_empty() {
                            members.push(cur.trim().to_string());
                        }
                        cur.clear();
                    }
                    c => cur.push(c),
                }
                i += 1;
            }
            if members.is_empty() {
                tokens.push(format!("{}()", head));
            } else {
                for m in members {
                    tokens.push(format!("{}({})", head, m));
                }
            }
        } else {
            tokens.push(head);
        }
    }
    tokens
}

fn has_glob_metachars(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// Expand glob metacharacters in each token against the filesystem,
/// sorted, in the order `glob(3)` would return them. A pattern with no
/// matches is left as a literal token, matching the original's
/// `wildcard()` behavior of passing through names that don't expand.
pub fn expand_wildcards(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !has_glob_metachars(&token) {
            out.push(token);
            continue;
        }
        match glob::glob(&token) {
            Ok(paths) => {
                let mut matches: Vec<String> = paths
                    .filter_map(|p| p.ok())
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                if matches.is_empty() {
                    out.push(token);
                } else {
                    matches.sort();
                    out.extend(matches);
                }
            }
            Err(_) => out.push(token),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_split_on_whitespace() {
        assert_eq!(
            tokenize_archive_aware("a.o  b.o\tc.o"),
            vec!["a.o", "b.o", "c.o"]
        );
    }

    #[test]
    fn archive_members_spread_into_separate_tokens() {
        assert_eq!(
            tokenize_archive_aware("lib.a(a.o b.o) other.o"),
            vec!["lib.a(a.o)", "lib.a(b.o)", "other.o"]
        );
    }

    #[test]
    fn single_member_archive_token_unchanged() {
        assert_eq!(tokenize_archive_aware("lib.a(a.o)"), vec!["lib.a(a.o)"]);
    }

    #[test]
    fn unmatched_glob_passes_through_literally() {
        let out = expand_wildcards(vec!["no_such_file_*.zzz".to_string()]);
        assert_eq!(out, vec!["no_such_file_*.zzz".to_string()]);
    }
}
