use indexmap::IndexMap;

use crate::error::MakeError;
use crate::graph::RuleId;

/// Handle into `NameTable::names`. Replaces the original's
/// `struct name *` linked structure with an arena index, per spec.md §9's
/// own suggested improvement (see DESIGN.md "Build evaluator (C7)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub u32);

/// Modification time, seconds + nanoseconds. Compared as a pair so that
/// two files written within the same second are still ordered correctly,
/// matching the original's `struct timespec` comparison in `modtime.c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ModTime {
    pub sec: i64,
    pub nsec: i64,
}

impl ModTime {
    pub const UNKNOWN: ModTime = ModTime { sec: -1, nsec: 0 };

    pub fn is_unknown(&self) -> bool {
        self.sec < 0
    }
}

/// A small hand-rolled bitset, in the style of the flags the original C
/// code ORs into a single byte/word. `bitflags` isn't part of the example
/// corpus's observed dependency surface, so this is written out instead
/// of pulling in a new crate for one struct.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $val:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name(pub $ty);

        impl $name {
            $(pub const $flag: $name = $name($val);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(&self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: $name) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    /// Per-name status bits. Named after the original's `N_*` flags in
    /// `make.h`.
    pub struct NameFlags: u32 {
        const DOING = 1 << 0;
        const DONE = 1 << 1;
        const TARGET = 1 << 2;
        const PRECIOUS = 1 << 3;
        const SILENT = 1 << 4;
        const IGNORE = 1 << 5;
        const SPECIAL = 1 << 6;
        const MARK = 1 << 7;
        const DOUBLE = 1 << 8;
        const INFERENCE = 1 << 9;
        const PHONY = 1 << 10;
        const EXISTS = 1 << 11;
    }
}

/// An interned target/prerequisite name plus the rules and status that
/// attach to it.
#[derive(Debug, Clone)]
pub struct Name {
    pub id: NameId,
    pub name: String,
    pub rules: Vec<RuleId>,
    pub mtime: Option<ModTime>,
    pub flags: NameFlags,
}

impl Name {
    fn new(id: NameId, name: String) -> Self {
        Name {
            id,
            name,
            rules: Vec::new(),
            mtime: None,
            flags: NameFlags::empty(),
        }
    }
}

/// Interning table for target/prerequisite names.
///
/// Iteration order follows declaration order (`IndexMap`), not the
/// original's hash-bucket order — see DESIGN.md Open Question 3.
#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<Name>,
    index: IndexMap<String, NameId>,
    pub first_name: Option<NameId>,
}

impl NameTable {
    pub fn new() -> Self {
        NameTable::default()
    }

    pub fn get(&self, id: NameId) -> &Name {
        &self.names[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NameId) -> &mut Name {
        &mut self.names[id.0 as usize]
    }

    pub fn find(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// Intern `name`, creating it if this is the first reference. The very
    /// first target-type name ever created becomes `first_name`, used as
    /// the default goal when no target is named on the command line
    /// (`make.c`'s `firstname`).
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(Name::new(id, name.to_string()));
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn intern_target(&mut self, name: &str) -> Result<NameId, MakeError> {
        let id = self.intern(name);
        let is_new_target = !self.get(id).flags.contains(NameFlags::TARGET);
        if is_new_target {
            self.get_mut(id).flags.insert(NameFlags::TARGET);
            if self.first_name.is_none() && !name.starts_with('.') {
                self.first_name = Some(id);
            }
        }
        Ok(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Name> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut t = NameTable::new();
        let a = t.intern("foo.c");
        let b = t.intern("foo.c");
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn first_target_name_is_remembered() {
        let mut t = NameTable::new();
        t.intern_target(".PHONY").unwrap();
        let first = t.intern_target("all").unwrap();
        assert_eq!(t.first_name, Some(first));
    }
}
