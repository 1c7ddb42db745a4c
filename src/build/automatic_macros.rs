use crate::expand::AutomaticMacros;
use crate::modtime::splitlib;
use crate::symtab::{ModTime, NameId, NameTable};

/// Bind `$@ $% $? $< $* $^ $+` for one rule evaluation. `newer` is the
/// set of prerequisites whose mtime is greater than or equal to the
/// target's (for `$?`); `raw_deps` is every prerequisite in declaration
/// order, duplicates and all — `$+` uses it verbatim, while `$^` first-
/// occurrence-deduplicates it, per spec.md §4.7 ("`$+` = all, with
/// repeats" vs "`$^` = first-occurrence dedup"); `implicit` and `stem`
/// come from a successful inference match, if any.
pub fn bind_automatic_macros(
    names: &NameTable,
    target: NameId,
    raw_deps: &[NameId],
    newer: &[NameId],
    implicit: Option<NameId>,
    stem: Option<&str>,
) -> AutomaticMacros {
    let target_name = names.get(target).name.clone();
    let (_, member) = splitlib(&target_name).unwrap_or((target_name.clone(), None));

    let join = |ids: &[NameId]| -> String {
        ids.iter()
            .map(|id| names.get(*id).name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut deduped: Vec<NameId> = Vec::new();
    for &id in raw_deps {
        if !deduped.contains(&id) {
            deduped.push(id);
        }
    }

    AutomaticMacros {
        at: target_name,
        percent: member.unwrap_or_default(),
        question: join(newer),
        less: implicit.map(|id| names.get(id).name.clone()).unwrap_or_default(),
        star: stem.map(str::to_string).unwrap_or_default(),
        caret: join(&deduped),
        plus: join(raw_deps),
    }
}

#[allow(dead_code)]
fn is_newer(candidate: ModTime, target: ModTime) -> bool {
    target.is_unknown() || candidate > target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_at_and_question() {
        let mut names = NameTable::new();
        let t = names.intern_target("foo.o").unwrap();
        let d1 = names.intern("foo.c");
        let d2 = names.intern("foo.h");
        let auto = bind_automatic_macros(&names, t, &[d1, d2], &[d1], None, None);
        assert_eq!(auto.at, "foo.o");
        assert_eq!(auto.question, "foo.c");
        assert_eq!(auto.caret, "foo.c foo.h");
    }

    #[test]
    fn caret_dedups_but_plus_keeps_repeats() {
        let mut names = NameTable::new();
        let t = names.intern_target("all").unwrap();
        let a = names.intern("a");
        let auto = bind_automatic_macros(&names, t, &[a, a], &[], None, None);
        assert_eq!(auto.caret, "a");
        assert_eq!(auto.plus, "a a");
    }
}
