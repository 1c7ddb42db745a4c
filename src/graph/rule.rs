use crate::error::SourcePos;
use crate::symtab::NameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CmdId(pub u32);

/// A single command line attached to a rule, stored verbatim as written
/// (still carrying any leading `@`/`-`/`+` prefix and any macro
/// references). Per spec.md §4.8, the prefix is only meaningful once the
/// line has been macro-expanded (a prefix can itself come from a macro,
/// e.g. `$(Q)echo hi`), so stripping it happens in the command runner
/// after expansion, not here at parse time.
#[derive(Debug, Clone)]
pub struct Cmd {
    pub id: CmdId,
    pub text: String,
    pub pos: SourcePos,
}

/// One `target: prereqs` rule body. A name may have more than one `Rule`
/// attached (multiple single-colon rules combine their prerequisites;
/// double-colon rules stay as separate, independently-evaluated bodies).
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub deps: Vec<NameId>,
    pub cmds: Vec<CmdId>,
    pub double_colon: bool,
    pub pos: SourcePos,
}

/// Flat storage for every `Rule`/`Cmd` created while parsing. Indices are
/// stable for the engine's lifetime: nothing is ever removed.
#[derive(Debug, Default)]
pub struct RuleArena {
    rules: Vec<Rule>,
    cmds: Vec<Cmd>,
}

impl RuleArena {
    pub fn new() -> Self {
        RuleArena::default()
    }

    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    pub fn add_cmd(&mut self, text: String, pos: SourcePos) -> CmdId {
        let id = CmdId(self.cmds.len() as u32);
        self.cmds.push(Cmd { id, text, pos });
        id
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0 as usize]
    }

    pub fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.0 as usize]
    }

    pub fn cmd(&self, id: CmdId) -> &Cmd {
        &self.cmds[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_cmd_stores_text_verbatim_prefix_and_all() {
        let mut arena = RuleArena::new();
        let id = arena.add_cmd("  -@echo hi".to_string(), SourcePos::default());
        assert_eq!(arena.cmd(id).text, "  -@echo hi");
    }
}
