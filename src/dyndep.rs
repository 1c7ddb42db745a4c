//! Inference ("dynamic dependency") resolution: finding a suffix rule
//! and an implicit prerequisite for a target with no explicit recipe.
//!
//! Grounded on `rules.c`'s `dyndep0`/`dyndep`/`has_suffix`. See
//! DESIGN.md "Inference resolver / dyndep (C5)".

use std::collections::HashSet;

use crate::error::MakeError;
use crate::graph::{RuleArena, RuleId};
use crate::modtime::splitlib;
use crate::pragma::Standard;
use crate::symtab::{NameFlags, NameId, NameTable};

/// The result of successfully inferring how to build a target via a
/// suffix rule: the implicit prerequisite name, the stem the `$*`
/// automatic macro should bind to, and the rule whose command list
/// applies.
#[derive(Debug, Clone)]
pub struct InferenceMatch {
    pub implicit_prereq: NameId,
    pub stem: String,
    pub rule: RuleId,
}

/// Try to find an inference rule that can build `target`. Returns `None`
/// if no suffix rule chain produces an existing or buildable
/// prerequisite.
pub fn find_inference(
    names: &mut NameTable,
    rules: &RuleArena,
    standard: Standard,
    target: NameId,
) -> Result<Option<InferenceMatch>, MakeError> {
    let target_name = names.get(target).name.clone();
    let (base, member) = splitlib(&target_name)?;

    // POSIX restricts inference rules to single/double-suffix names on
    // plain targets; the extension lifts that for targets other than
    // `lib.a(member.o)`, per `dyndep`'s `!posix && member == NULL` guard.
    if standard.allows_non_posix_extensions() && member.is_none() {
        let suffixes = suffix_list(names, rules);
        let mut found_suffix = false;
        for tsuff in &suffixes {
            if let Some(stem) = base.strip_suffix(tsuff.as_str()) {
                if stem.is_empty() {
                    continue;
                }
                found_suffix = true;
                let mut visited = HashSet::new();
                if let Some(m) = dyndep0(names, rules, standard, stem, tsuff, &mut visited)? {
                    return Ok(Some(m));
                }
            }
        }
        if !found_suffix {
            let mut visited = HashSet::new();
            return dyndep0(names, rules, standard, &base, "", &mut visited);
        }
        return Ok(None);
    }

    let effective_base = member.as_deref().unwrap_or(&base);
    let tsuff = suffix_of(effective_base).to_string();
    let stem = &effective_base[..effective_base.len() - tsuff.len()];
    let mut visited = HashSet::new();
    dyndep0(names, rules, standard, stem, &tsuff, &mut visited)
}

/// Suffix (including the leading `.`) of `name`, or `""` if it has none.
fn suffix_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// The current `.SUFFIXES` list, in declaration order. Also used by the
/// parser to classify a dotted target name as an inference rule.
pub fn suffix_list(names: &NameTable, rules: &RuleArena) -> Vec<String> {
    let Some(id) = names.find(".SUFFIXES") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for &rid in &names.get(id).rules {
        for &dep in &rules.rule(rid).deps {
            out.push(names.get(dep).name.clone());
        }
    }
    out
}

/// Search `.SUFFIXES` for a source suffix `psuff` such that a rule named
/// `psuff+tsuff` (e.g. `.c.o`) exists, and `base+psuff` is either an
/// existing file, a known target, or (when chaining is allowed) itself
/// producible by another round of inference. `visited` records which
/// candidate suffix-rule names have already been tried in this search, to
/// stop runaway chains — the original guards the same thing with a
/// `N_MARK` flag on the candidate rule's `struct name`.
fn dyndep0(
    names: &mut NameTable,
    rules: &RuleArena,
    standard: Standard,
    base: &str,
    tsuff: &str,
    visited: &mut HashSet<String>,
) -> Result<Option<InferenceMatch>, MakeError> {
    let suffixes = suffix_list(names, rules);
    let mut chain = false;
    loop {
        for psuff in &suffixes {
            let rule_name = format!("{}{}", psuff, tsuff);
            let Some(rule_name_id) = names.find(&rule_name) else {
                continue;
            };
            let candidate_rules = names.get(rule_name_id).rules.clone();
            if candidate_rules.is_empty() {
                continue;
            }
            if chain && !visited.insert(rule_name.clone()) {
                continue;
            }

            let implicit_name = format!("{}{}", base, psuff);
            let implicit_id = names.intern(&implicit_name);
            // "if candidate is DOING: skip" — a target already mid-build
            // on the current recursion stack is never accepted as an
            // inferred prerequisite, per spec.md §4.5 and `rules.c`'s
            // `if ((ip->n_flag & N_DOING)) continue;`.
            if names.get(implicit_id).flags.contains(NameFlags::DOING) {
                continue;
            }
            let has_own_rule = !names.get(implicit_id).rules.is_empty();
            let on_disk = crate::modtime::probe(&implicit_name)
                .map(|m| !m.is_unknown())
                .unwrap_or(false);

            let got_it = if !chain {
                on_disk || has_own_rule
            } else {
                dyndep0(names, rules, standard, &implicit_name, "", visited)?.is_some()
                    || on_disk
                    || has_own_rule
            };

            if got_it {
                let rule_id = candidate_rules[0];
                return Ok(Some(InferenceMatch {
                    implicit_prereq: implicit_id,
                    stem: base.to_string(),
                    rule: rule_id,
                }));
            }
        }

        if standard.allows_non_posix_extensions() && !chain {
            chain = true;
            continue;
        }
        return Ok(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Rule, RuleArena};
    use crate::symtab::NameTable;

    #[test]
    fn finds_simple_c_to_o_rule() {
        let mut names = NameTable::new();
        let mut rules = RuleArena::new();

        let suffixes_id = names.intern_target(".SUFFIXES").unwrap();
        let o = names.intern(".o");
        let c = names.intern(".c");
        let suffixes_rule = rules.add_rule(Rule {
            deps: vec![o, c],
            cmds: vec![],
            double_colon: false,
            pos: Default::default(),
        });
        names.get_mut(suffixes_id).rules.push(suffixes_rule);

        let co_id = names.intern_target(".c.o").unwrap();
        let co_rule = rules.add_rule(Rule {
            deps: vec![],
            cmds: vec![],
            double_colon: false,
            pos: Default::default(),
        });
        names.get_mut(co_id).rules.push(co_rule);

        // implicit prerequisite is treated as "already a known target"
        let target = names.intern_target("main.o").unwrap();
        names.intern_target("main.c").unwrap();

        let result = find_inference(&mut names, &rules, Standard::Extended, target).unwrap();
        assert!(result.is_some());
        let m = result.unwrap();
        assert_eq!(names.get(m.implicit_prereq).name, "main.c");
        assert_eq!(m.stem, "main");
    }
}
