use indexmap::IndexMap;

/// A single macro binding. `level` follows the original's precedence
/// scheme (`macro.c`): 0 internal, 1 command line, 2 MAKEFLAGS, 3
/// environment, 4 makefile — lower numbers win, and `setmacro` only
/// overwrites a binding with one of equal or lower level.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub value: String,
    pub level: u8,
    /// `true` for `:=`/`::=`/`:::=` bindings: the value was expanded once
    /// at assignment time and is stored literal from then on.
    pub immediate: bool,
    /// Set while this macro's value is itself being expanded, to detect
    /// `FOO = $(FOO)`-style direct self-reference (`input.c`'s
    /// `expand_macros` recursion guard).
    pub in_expansion: bool,
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: IndexMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn value(&self, name: &str) -> &str {
        self.macros.get(name).map(|m| m.value.as_str()).unwrap_or("")
    }

    /// Bind `name` to `value` at precedence `level`, honoring the
    /// original's rule that a binding is only replaced by one whose level
    /// is numerically <= the existing one (lower level = higher
    /// precedence), except that level 0 (internal, e.g. automatic macros)
    /// always wins and level 4 (makefile) never overrides anything already
    /// set at a stronger level.
    pub fn set(&mut self, name: &str, value: &str, level: u8, immediate: bool) {
        if let Some(existing) = self.macros.get(name) {
            if level > existing.level {
                return;
            }
        }
        self.macros.insert(
            name.to_string(),
            Macro {
                name: name.to_string(),
                value: value.to_string(),
                level,
                immediate,
                in_expansion: false,
            },
        );
    }

    /// Append `value` to the existing binding, space-separated, as `+=`
    /// does (POSIX 2024 extension). Creates the macro at `level` if it
    /// doesn't exist yet.
    pub fn append(&mut self, name: &str, value: &str, level: u8) {
        match self.macros.get_mut(name) {
            Some(m) if level <= m.level => {
                if !m.value.is_empty() && !value.is_empty() {
                    m.value.push(' ');
                }
                m.value.push_str(value);
            }
            Some(_) => {}
            None => self.set(name, value, level, false),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.macros.shift_remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    pub fn begin_expansion(&mut self, name: &str) -> bool {
        match self.macros.get_mut(name) {
            Some(m) if m.in_expansion => false,
            Some(m) => {
                m.in_expansion = true;
                true
            }
            None => true,
        }
    }

    pub fn end_expansion(&mut self, name: &str) {
        if let Some(m) = self.macros.get_mut(name) {
            m.in_expansion = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_level_number_wins() {
        let mut t = MacroTable::new();
        t.set("CC", "cc", 4, false); // makefile
        t.set("CC", "clang", 1, false); // command line
        assert_eq!(t.value("CC"), "clang");
        // A later makefile binding must not override the command-line one.
        t.set("CC", "gcc", 4, false);
        assert_eq!(t.value("CC"), "clang");
    }

    #[test]
    fn append_adds_space_separated() {
        let mut t = MacroTable::new();
        t.set("CFLAGS", "-O2", 4, false);
        t.append("CFLAGS", "-Wall", 4);
        assert_eq!(t.value("CFLAGS"), "-O2 -Wall");
    }

    #[test]
    fn expansion_guard_detects_reentry() {
        let mut t = MacroTable::new();
        t.set("FOO", "$(FOO)", 4, false);
        assert!(t.begin_expansion("FOO"));
        assert!(!t.begin_expansion("FOO"));
        t.end_expansion("FOO");
        assert!(t.begin_expansion("FOO"));
    }
}
