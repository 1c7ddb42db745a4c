//! Special (dot) target names, grounded on `main.c`'s `mark_special` and
//! `target.c`'s handling of `.SUFFIXES`/`.DEFAULT`.

use crate::symtab::{NameFlags, NameTable};

pub const POSIX: &str = ".POSIX";
pub const SILENT: &str = ".SILENT";
pub const IGNORE: &str = ".IGNORE";
pub const PRECIOUS: &str = ".PRECIOUS";
pub const PHONY: &str = ".PHONY";
pub const SUFFIXES: &str = ".SUFFIXES";
pub const DEFAULT: &str = ".DEFAULT";
pub const NOTPARALLEL: &str = ".NOTPARALLEL";
pub const WAIT: &str = ".WAIT";
pub const PRAGMA: &str = ".PRAGMA";

/// What kind of target a name on the left of a rule's `:` is, per
/// `input.c`'s `target_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Normal,
    /// One of the fixed dotted names in `is_special`.
    Special,
    /// `.s` or `.s1.s2` where each `.sN` is a member of the current
    /// `.SUFFIXES` list.
    Inference,
}

/// Classify `name` per `target_type`: a dotted name is `Special` if it
/// exactly matches a known special target, `Inference` if it is itself a
/// known suffix or splits into two known suffixes back-to-back, else
/// `Normal`. `suffixes` is the current `.SUFFIXES` list in declaration
/// order (as produced by `dyndep::suffix_list`-style lookups).
pub fn classify_target_type(name: &str, suffixes: &[String]) -> TargetType {
    if !name.starts_with('.') {
        return TargetType::Normal;
    }
    if is_special(name) {
        return TargetType::Special;
    }
    if suffixes.iter().any(|s| s == name) {
        return TargetType::Inference;
    }
    for suffix in suffixes {
        if let Some(rest) = name.strip_prefix(suffix.as_str()) {
            if suffixes.iter().any(|s| s == rest) {
                return TargetType::Inference;
            }
        }
    }
    TargetType::Normal
}

/// If the global option implied by `special` hasn't already been set on
/// the command line, mark every prerequisite of that special target with
/// `flag`. If the special target has no prerequisites of its own, fall
/// back to treating it as if it applied globally (mirrors `main.c`'s
/// `mark_special`, used for `.SILENT`/`.IGNORE`/`.PRECIOUS` with no
/// arguments meaning "apply to everything").
pub fn mark_special(
    names: &mut NameTable,
    rules: &crate::graph::RuleArena,
    special: &str,
    already_set_globally: bool,
    flag: NameFlags,
) -> bool {
    if already_set_globally {
        return false;
    }
    let Some(special_id) = names.find(special) else {
        return false;
    };
    let rule_ids = names.get(special_id).rules.clone();
    let mut marked = false;
    for rid in rule_ids {
        for &dep in &rules.rule(rid).deps {
            names.get_mut(dep).flags.insert(flag);
            marked = true;
        }
    }
    marked
}

pub fn is_special(name: &str) -> bool {
    matches!(
        name,
        POSIX | SILENT | IGNORE | PRECIOUS | PHONY | SUFFIXES | DEFAULT | NOTPARALLEL | WAIT | PRAGMA
    )
}

#[cfg(test)]
mod target_type_tests {
    use super::*;

    #[test]
    fn special_names_recognized() {
        assert_eq!(classify_target_type(".PHONY", &[]), TargetType::Special);
    }

    #[test]
    fn double_suffix_inference_rule() {
        let suffixes = vec![".c".to_string(), ".o".to_string()];
        assert_eq!(classify_target_type(".c.o", &suffixes), TargetType::Inference);
        assert_eq!(classify_target_type(".o", &suffixes), TargetType::Inference);
        assert_eq!(classify_target_type(".weird", &suffixes), TargetType::Normal);
    }

    #[test]
    fn plain_name_is_normal() {
        assert_eq!(classify_target_type("foo.o", &[]), TargetType::Normal);
    }
}
