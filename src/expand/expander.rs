use crate::error::MakeError;
use crate::symtab::MacroTable;

use super::modifiers::{dir_modifier, file_modifier, pattern_subst, suffix_replace};

/// The automatic macros bound while evaluating a single rule: `$@ $% $?
/// $< $* $^ $+`. Grounded on `make.c`'s per-rule binding of these before
/// running its command list.
#[derive(Debug, Clone, Default)]
pub struct AutomaticMacros {
    /// `$@` — the target name.
    pub at: String,
    /// `$%` — the archive member name, for `lib(member)` targets.
    pub percent: String,
    /// `$?` — prerequisites newer than the target, space separated.
    pub question: String,
    /// `$<` — the prerequisite that triggered an inference rule.
    pub less: String,
    /// `$*` — the target stem an inference rule matched.
    pub star: String,
    /// `$^` — all prerequisites, space separated (extension).
    pub caret: String,
    /// `$+` — all prerequisites including duplicates, space separated
    /// (extension).
    pub plus: String,
}

impl AutomaticMacros {
    fn lookup(&self, c: char) -> Option<&str> {
        match c {
            '@' => Some(&self.at),
            '%' => Some(&self.percent),
            '?' => Some(&self.question),
            '<' => Some(&self.less),
            '*' => Some(&self.star),
            '^' => Some(&self.caret),
            '+' => Some(&self.plus),
            _ => None,
        }
    }
}

const MAX_DEPTH: u32 = 64;

pub struct Expander<'a> {
    macros: &'a mut MacroTable,
    auto: &'a AutomaticMacros,
    /// When set, a literal `$$` in the input is copied through as `$$`
    /// instead of being collapsed to `$`. Used once, for the one-time
    /// RHS expansion of a `:::=` (BSD-style delayed) assignment, per
    /// spec.md §4.2's `except_dollar_dollar` parameter.
    preserve_dollar_dollar: bool,
}

impl<'a> Expander<'a> {
    pub fn new(macros: &'a mut MacroTable, auto: &'a AutomaticMacros) -> Self {
        Expander {
            macros,
            auto,
            preserve_dollar_dollar: false,
        }
    }

    /// An expander for `:::=` RHS expansion: `$$` passes through
    /// unchanged rather than collapsing to `$`, so the stored value still
    /// reads as "delayed" on its next (real) expansion.
    pub fn new_preserving_dollar_dollar(macros: &'a mut MacroTable, auto: &'a AutomaticMacros) -> Self {
        Expander {
            macros,
            auto,
            preserve_dollar_dollar: true,
        }
    }

    pub fn expand(&mut self, text: &str) -> Result<String, MakeError> {
        self.expand_depth(text, 0)
    }

    fn expand_depth(&mut self, text: &str, depth: u32) -> Result<String, MakeError> {
        if depth > MAX_DEPTH {
            return Err(MakeError::NestingTooDeep);
        }
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '$' && i + 1 < chars.len() {
                let next = chars[i + 1];
                match next {
                    '$' => {
                        if self.preserve_dollar_dollar {
                            out.push_str("$$");
                        } else {
                            out.push('$');
                        }
                        i += 2;
                    }
                    '(' | '{' => {
                        let open = next;
                        let close = if open == '(' { ')' } else { '}' };
                        let (inner, consumed) = extract_balanced(&chars[i + 2..], open, close)?;
                        out.push_str(&self.expand_reference(&inner, depth)?);
                        i += 2 + consumed + 1;
                    }
                    c if !c.is_whitespace() => {
                        out.push_str(&self.expand_reference(&c.to_string(), depth)?);
                        i += 2;
                    }
                    _ => {
                        out.push('$');
                        i += 1;
                    }
                }
            } else {
                out.push(chars[i]);
                i += 1;
            }
        }
        Ok(out)
    }

    /// Expand a single `$(...)`/`${...}`/`$X` reference body, dispatching
    /// on whether it carries a `name:modifier` form.
    fn expand_reference(&mut self, body: &str, depth: u32) -> Result<String, MakeError> {
        // `$(@D)`/`$(@F)`-style forms: an automatic-macro name directly
        // followed by `D`/`F`, with no `:` at all. Detected on the name
        // itself before colon-splitting, mirroring `input.c`'s check of
        // `name[1]` independent of any `:find=repl` part.
        if let Some(result) = self.try_auto_dir_file(body) {
            return Ok(result);
        }
        if let Some(colon) = find_top_level_colon(body) {
            let name_raw = &body[..colon];
            let modifier_raw = &body[colon + 1..];
            let name = self.expand_depth(name_raw, depth + 1)?;
            let modifier = self.expand_depth(modifier_raw, depth + 1)?;
            let base = self.lookup(&name, depth)?;
            Ok(apply_modifier(&base, &modifier))
        } else {
            let name = self.expand_depth(body, depth + 1)?;
            self.lookup(&name, depth)
        }
    }

    /// If `body` is exactly a single automatic-macro character followed
    /// by `D` or `F` (e.g. `@D`, `%F`), return the directory/filename
    /// part of that automatic macro's current value. `None` for anything
    /// else, including a body whose first character isn't bound as an
    /// automatic macro (so a genuine two-letter macro name like `XD`
    /// falls through unaffected).
    fn try_auto_dir_file(&self, body: &str) -> Option<String> {
        let mut chars = body.chars();
        let first = chars.next()?;
        let second = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        if second != 'D' && second != 'F' {
            return None;
        }
        let base = self.auto.lookup(first)?;
        Some(if second == 'D' {
            dir_modifier(base)
        } else {
            file_modifier(base)
        })
    }

    fn lookup(&mut self, name: &str, depth: u32) -> Result<String, MakeError> {
        if name.chars().count() == 1 {
            if let Some(v) = self.auto.lookup(name.chars().next().unwrap()) {
                return Ok(v.to_string());
            }
        }
        if !self.macros.contains(name) {
            return Ok(String::new());
        }
        if !self.macros.begin_expansion(name) {
            return Err(MakeError::RecursiveMacro(name.to_string()));
        }
        let raw = self.macros.value(name).to_string();
        let result = if self
            .macros
            .get(name)
            .map(|m| m.immediate)
            .unwrap_or(false)
        {
            Ok(raw)
        } else {
            self.expand_depth(&raw, depth + 1)
        };
        self.macros.end_expansion(name);
        result
    }
}

/// Find the first `:` in `body` that isn't inside a nested `$(...)` /
/// `${...}` reference.
fn find_top_level_colon(body: &str) -> Option<usize> {
    let mut depth = 0i32;
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '$' if i + 1 < chars.len() && (chars[i + 1] == '(' || chars[i + 1] == '{') => {
                depth += 1;
                i += 1;
            }
            ')' | '}' if depth > 0 => {
                depth -= 1;
            }
            ':' if depth == 0 => return Some(byte_index(&chars, i)),
            _ => {}
        }
        i += 1;
    }
    None
}

fn byte_index(chars: &[char], char_idx: usize) -> usize {
    chars[..char_idx].iter().map(|c| c.len_utf8()).sum()
}

/// Scan `chars` for the `close` that balances the `open` just consumed,
/// counting nested same-type pairs. Returns the inner text and how many
/// characters (not counting the closing one) were consumed.
fn extract_balanced(chars: &[char], open: char, close: char) -> Result<(String, usize), MakeError> {
    let mut depth = 1;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == open {
            depth += 1;
        } else if chars[i] == close {
            depth -= 1;
            if depth == 0 {
                return Ok((chars[..i].iter().collect(), i));
            }
        }
        i += 1;
    }
    Err(MakeError::UnterminatedVariable(
        chars.iter().collect::<String>(),
    ))
}

fn apply_modifier(value: &str, modifier: &str) -> String {
    match modifier.chars().next() {
        Some('D') if modifier.len() == 1 => dir_modifier(value),
        Some('F') if modifier.len() == 1 => file_modifier(value),
        _ => match modifier.find('=') {
            Some(eq) => {
                let pat = &modifier[..eq];
                let repl = &modifier[eq + 1..];
                if pat.contains('%') {
                    pattern_subst(value, pat, repl)
                } else {
                    suffix_replace(value, pat, repl)
                }
            }
            None => value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_with(macros: &mut MacroTable, auto: &AutomaticMacros, text: &str) -> String {
        Expander::new(macros, auto).expand(text).unwrap()
    }

    #[test]
    fn simple_paren_and_brace_forms() {
        let mut m = MacroTable::new();
        m.set("CC", "cc", 4, false);
        let auto = AutomaticMacros::default();
        assert_eq!(expand_with(&mut m, &auto, "$(CC)"), "cc");
        assert_eq!(expand_with(&mut m, &auto, "${CC}"), "cc");
    }

    #[test]
    fn dollar_dollar_is_literal() {
        let mut m = MacroTable::new();
        let auto = AutomaticMacros::default();
        assert_eq!(expand_with(&mut m, &auto, "$$HOME"), "$HOME");
    }

    #[test]
    fn automatic_macro_at() {
        let mut m = MacroTable::new();
        let auto = AutomaticMacros {
            at: "foo.o".to_string(),
            ..Default::default()
        };
        assert_eq!(expand_with(&mut m, &auto, "$@"), "foo.o");
        assert_eq!(expand_with(&mut m, &auto, "$(@D)"), ".");
    }

    #[test]
    fn suffix_modifier() {
        let mut m = MacroTable::new();
        m.set("SRCS", "a.c b.c", 4, false);
        let auto = AutomaticMacros::default();
        assert_eq!(expand_with(&mut m, &auto, "$(SRCS:.c=.o)"), "a.o b.o");
    }

    #[test]
    fn suffix_and_pattern_substitution_laws() {
        let mut m = MacroTable::new();
        m.set("X", "fa ba a", 4, false);
        let auto = AutomaticMacros::default();
        assert_eq!(expand_with(&mut m, &auto, "$(X:a=b)"), "fb bb b");

        let mut m2 = MacroTable::new();
        m2.set("Y", "px1s px2s y", 4, false);
        assert_eq!(expand_with(&mut m2, &auto, "$(Y:p%s=q%t)"), "qx1t qx2t y");
    }

    #[test]
    fn self_reference_is_rejected() {
        let mut m = MacroTable::new();
        m.set("FOO", "$(FOO)", 4, false);
        let auto = AutomaticMacros::default();
        let err = Expander::new(&mut m, &auto).expand("$(FOO)").unwrap_err();
        assert!(matches!(err, MakeError::RecursiveMacro(_)));
    }
}
