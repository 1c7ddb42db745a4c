//! Pure per-word transforms used by `$(VAR:...)` modifiers.
//!
//! Hand-written range-based string code rather than a regex crate, per
//! spec.md §9's own design note that this is "best expressed as small
//! pure functions returning borrowed sub-ranges" — see DESIGN.md
//! "Dependency drops".

/// `$(VAR:from=to)`: for each whitespace-separated word in `value` that
/// ends with `from`, replace that trailing suffix with `to`. Words that
/// don't end with `from` pass through unchanged.
pub fn suffix_replace(value: &str, from: &str, to: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            if !from.is_empty() && word.ends_with(from) {
                format!("{}{}", &word[..word.len() - from.len()], to)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `$(VAR:pat=repl)` where `pat` contains exactly one `%`: splits `pat`
/// into a prefix and suffix around the `%`, and for each word that starts
/// with the prefix and ends with the suffix (with enough room left over
/// for the part the `%` stands in for), substitutes the `%` in `repl`
/// with that matched middle section. Words that don't match pass through
/// unchanged, per `rules.c`'s pattern matching used for inference and
/// reproduced here for macro modifiers.
pub fn pattern_subst(value: &str, pat: &str, repl: &str) -> String {
    let Some(pct) = pat.find('%') else {
        return suffix_replace(value, pat, repl);
    };
    let prefix = &pat[..pct];
    let suffix = &pat[pct + 1..];

    value
        .split_whitespace()
        .map(|word| match match_pattern(word, prefix, suffix) {
            Some(middle) => repl.replacen('%', middle, 1),
            None => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the substring `word` matched against `%` in `prefix%suffix`,
/// if `word` starts with `prefix`, ends with `suffix`, and those two
/// don't overlap.
fn match_pattern<'w>(word: &'w str, prefix: &str, suffix: &str) -> Option<&'w str> {
    if !word.starts_with(prefix) || !word.ends_with(suffix) {
        return None;
    }
    if word.len() < prefix.len() + suffix.len() {
        return None;
    }
    Some(&word[prefix.len()..word.len() - suffix.len()])
}

/// `$(@D)`-style directory modifier: the directory part of each word, or
/// `.` if the word has no directory component.
pub fn dir_modifier(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| match word.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) => word[..idx].to_string(),
            None => ".".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `$(@F)`-style filename modifier: the filename part of each word (the
/// text after the last `/`, or the whole word if there is none).
pub fn file_modifier(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| match word.rfind('/') {
            Some(idx) => word[idx + 1..].to_string(),
            None => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_replace_only_touches_matching_words() {
        assert_eq!(suffix_replace("foo.c bar.o", ".c", ".o"), "foo.o bar.o");
    }

    #[test]
    fn pattern_subst_matches_percent() {
        assert_eq!(pattern_subst("src/foo.c src/bar.c", "src/%.c", "obj/%.o"), "obj/foo.o obj/bar.o");
    }

    #[test]
    fn dir_and_file_modifiers_split_on_last_slash() {
        assert_eq!(dir_modifier("a/b/c.o"), "a/b");
        assert_eq!(file_modifier("a/b/c.o"), "c.o");
        assert_eq!(dir_modifier("c.o"), ".");
    }
}
