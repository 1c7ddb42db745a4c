//! The stateful makefile-reading driver: ties together the line reader,
//! the stateless parser transforms, the symbol tables, and the rule
//! arena into one `input()`-equivalent pass, plus the post-parse
//! special-target bookkeeping `main()` performs once reading is done.
//!
//! Grounded on `input.c`'s `input()` main loop and `target.c`'s
//! `addrule`. See DESIGN.md "Parser (C4)" / "Name table (C1)".

use std::io::Cursor;

use crate::dyndep::suffix_list;
use crate::error::{MakeError, SourcePos};
use crate::expand::{AutomaticMacros, Expander};
use crate::graph::special::{self, mark_special};
use crate::graph::{classify_target_type, CmdId, Rule, RuleArena, TargetType};
use crate::lexer::{builtin_rules_text, ConditionalStack, Directive, LineReader, LogicalLine};
use crate::parser::{apply_assignment, classify, parse_rule_line, AssignOp, LineKind};
use crate::pragma::{Pragma, Standard};
use crate::symtab::{validate_macro_name, validate_target_name, MacroTable, NameFlags, NameId, NameTable};

const MAX_INCLUDE_DEPTH: u32 = 16;

/// Everything accumulated while reading one or more makefiles: symbol
/// tables, the rule arena, and parser-level mode (standard/pragma/
/// conditional nesting). Built incrementally by `read_builtin_rules` and
/// `read_file`/`read_stdin`, then finalized by `finish` and handed to the
/// build evaluator.
pub struct Engine {
    pub names: NameTable,
    pub macros: MacroTable,
    pub rules: RuleArena,
    pub standard: Standard,
    pub pragma: Pragma,
    /// `-e`: environment beats makefile assignments.
    pub use_env: bool,
    conditional: ConditionalStack,
    /// Set by a bare `.SILENT:`/`.IGNORE:`/`.PRECIOUS:` line (no
    /// prerequisites), once `finish` has run. Merge with the CLI's
    /// `-s`/`-i` flags to get the effective global setting.
    pub silent_global: bool,
    pub ignore_global: bool,
    pub precious_global: bool,
}

impl Engine {
    pub fn new(standard: Standard, use_env: bool) -> Self {
        let mut macros = MacroTable::new();
        macros.set("$", "$", 0, false);
        macros.set("SHELL", "/bin/sh", 4, false);
        Engine {
            names: NameTable::new(),
            macros,
            rules: RuleArena::new(),
            standard,
            pragma: Pragma::default(),
            use_env,
            conditional: ConditionalStack::new(),
            silent_global: false,
            ignore_global: false,
            precious_global: false,
        }
    }

    /// Precedence level new makefile-text assignments are made at: 3
    /// normally, so a later-read makefile naturally overrides an
    /// environment binding of the same level; bumped to 4 under `-e` so
    /// the environment binding (also level 3) wins instead. Built-in
    /// rule text always binds at level 4, per `input.c`'s
    /// `(useenv || fd == NULL) ? 4 : 3`.
    fn makefile_level(&self, is_builtin: bool) -> u8 {
        if is_builtin || self.use_env {
            4
        } else {
            3
        }
    }

    /// Bind an environment variable at level 3. Call once per `envp`
    /// entry before reading any makefile.
    pub fn set_env_macro(&mut self, name: &str, value: &str) {
        if validate_macro_name(name) {
            self.macros.set(name, value, 3, false);
        }
    }

    /// Bind a command-line `NAME=value` macro at level 1.
    pub fn set_cmdline_macro(&mut self, name: &str, value: &str) {
        self.macros.set(name, value, 1, false);
    }

    /// Bind a `MAKEFLAGS`-propagated macro at level 2.
    pub fn set_makeflags_macro(&mut self, name: &str, value: &str) {
        self.macros.set(name, value, 2, false);
    }

    pub fn read_builtin_rules(&mut self, norules: bool) -> Result<(), MakeError> {
        let text = builtin_rules_text(self.standard, norules);
        self.read_text(&text, None, true)
    }

    #[tracing::instrument(skip(self, path), fields(file = %path))]
    pub fn read_file(&mut self, path: &str) -> Result<(), MakeError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MakeError::CantOpen(path.to_string(), e.to_string()))?;
        self.read_text(&contents, Some(path.to_string()), false)
    }

    pub fn read_stdin(&mut self) -> Result<(), MakeError> {
        use std::io::Read;
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|e| MakeError::Other(e.to_string()))?;
        self.read_text(&contents, None, false)
    }

    /// Post-parse bookkeeping performed once after every makefile has
    /// been read, mirroring `main.c`'s calls to `mark_special` right
    /// before the first `make()`. `cli_silent`/`cli_ignore`/
    /// `cli_precious` are the `-s`/`-i`/the precious-everything option
    /// already in force from the command line.
    pub fn finish(&mut self, cli_silent: bool, cli_ignore: bool, cli_precious: bool) {
        self.silent_global = self.apply_global_special(special::SILENT, NameFlags::SILENT, cli_silent);
        self.ignore_global = self.apply_global_special(special::IGNORE, NameFlags::IGNORE, cli_ignore);
        self.precious_global = self.apply_global_special(special::PRECIOUS, NameFlags::PRECIOUS, cli_precious);
        mark_special(&mut self.names, &self.rules, special::PHONY, false, NameFlags::PHONY);
    }

    /// If the CLI hasn't already forced this flag globally, mark every
    /// prerequisite of `special` with `flag`; if `special` was declared
    /// with no prerequisites at all (`addrule` already cleared its rule
    /// list for a bare declaration), fall back to returning `true` so the
    /// caller can treat the flag as globally set. Grounded on
    /// `main.c`'s `mark_special`.
    fn apply_global_special(&mut self, special: &str, flag: NameFlags, already_global: bool) -> bool {
        if already_global {
            return true;
        }
        if self.names.find(special).is_none() {
            return false;
        }
        let marked = mark_special(&mut self.names, &self.rules, special, false, flag);
        !marked
    }

    /// Read and apply one complete makefile source: a depth-limited
    /// recursive pass over its logical lines, honoring conditionals,
    /// includes, assignments and rules. Grounded on `input.c`'s
    /// `input()`.
    fn read_text(&mut self, text: &str, file: Option<String>, is_builtin: bool) -> Result<(), MakeError> {
        self.read_text_at_depth(text, file, is_builtin, 0)
    }

    fn read_text_at_depth(
        &mut self,
        text: &str,
        file: Option<String>,
        is_builtin: bool,
        include_depth: u32,
    ) -> Result<(), MakeError> {
        let entry_depth = self.conditional.depth();

        let mut reader = LineReader::new(Cursor::new(text.as_bytes()));
        let mut lines: Vec<LogicalLine> = Vec::new();
        while let Some(line) = reader.next_logical_line()? {
            lines.push(line);
        }

        let mut i = 0usize;
        while i < lines.len() {
            let line = lines[i].clone();
            i += 1;

            if line.tab_prefixed {
                // A command line with no preceding rule: the accumulation
                // loop below always consumes the tab-prefixed lines that
                // belong to a rule, so any that reach here are genuinely
                // orphaned. Grounded on `input.c`'s unconditional
                // `if (*str1 == '\t') error("command not allowed here")`.
                return Err(MakeError::CommandNotAllowedHere);
            }

            let kind = classify(&line.text);

            // Conditional-directive lines update the nesting stack
            // whether or not the enclosing scope is currently active, so
            // that `endif`/`else` stay matched to their `if`. A plain
            // `ifdef`/`ifndef` condition is only ever evaluated when its
            // own immediately enclosing scope is live (an `if` nested in
            // dead code always pushes `false`); an `else ifdef`/`else
            // ifndef` condition is evaluated unconditionally and
            // `handle_else` itself gates activation on the parent frame,
            // since the branch it introduces may still become the one
            // that runs even though the preceding branch here did not.
            if let LineKind::Conditional(directive, expr) = &kind {
                match (directive, expr) {
                    (Directive::If, Some(expr)) => {
                        let cond = self.conditional.is_active() && self.evaluate_condition(expr)?;
                        self.conditional.push_if(cond)?;
                    }
                    (Directive::If, None) => return Err(MakeError::InvalidCondition),
                    (Directive::Else, Some(expr)) => {
                        let cond = self.evaluate_condition(expr)?;
                        self.conditional.handle_else(Some(cond))?;
                    }
                    (Directive::Else, None) => self.conditional.handle_else(None)?,
                    (Directive::Endif, _) => self.conditional.pop_endif()?,
                }
                continue;
            }

            if !self.conditional.is_active() {
                continue;
            }

            match kind {
                LineKind::Empty | LineKind::Comment => {}
                LineKind::Conditional(..) => unreachable!("handled above"),
                LineKind::Include { force, files } => {
                    self.handle_include(&files, force, include_depth)?;
                }
                LineKind::Assignment { name, op, value } => {
                    self.handle_assignment(&name, op, &value, is_builtin)?;
                }
                LineKind::Rule { text } => {
                    let pos = SourcePos {
                        file: file.clone(),
                        line: line.line,
                    };
                    let mut cmd_lines: Vec<(String, SourcePos)> = Vec::new();
                    while i < lines.len() && lines[i].tab_prefixed {
                        let cmd_line = &lines[i];
                        let stripped = cmd_line.text.strip_prefix('\t').unwrap_or(&cmd_line.text);
                        cmd_lines.push((
                            self.strip_command_comment(stripped),
                            SourcePos {
                                file: file.clone(),
                                line: cmd_line.line,
                            },
                        ));
                        i += 1;
                    }
                    self.handle_rule_line(&text, pos, cmd_lines)?;
                }
            }
        }

        if self.conditional.depth() != entry_depth {
            return Err(MakeError::InvalidConditionalNesting);
        }
        Ok(())
    }

    fn strip_command_comment(&self, text: &str) -> String {
        if self.standard.is_posix() && !self.pragma.command_comment {
            if let Some(idx) = text.find('#') {
                return text[..idx].to_string();
            }
        }
        text.to_string()
    }

    /// Evaluate an `ifdef NAME` / `ifndef NAME` condition string (the
    /// first word plus its operand, as produced by `classify`).
    fn evaluate_condition(&mut self, expr: &str) -> Result<bool, MakeError> {
        let mut parts = expr.splitn(2, char::is_whitespace);
        let keyword = parts.next().unwrap_or("");
        let operand = parts.next().unwrap_or("").trim();
        let expanded = self.expand(operand)?;
        let defined = self.macros.contains(expanded.trim());
        match keyword {
            "ifdef" => Ok(defined),
            "ifndef" => Ok(!defined),
            _ => Err(MakeError::InvalidCondition),
        }
    }

    fn expand(&mut self, text: &str) -> Result<String, MakeError> {
        let auto = AutomaticMacros::default();
        Expander::new(&mut self.macros, &auto).expand(text)
    }

    fn handle_include(&mut self, files_raw: &str, force: bool, include_depth: u32) -> Result<(), MakeError> {
        if include_depth + 1 > MAX_INCLUDE_DEPTH {
            return Err(MakeError::TooManyIncludes);
        }
        let expanded = self.expand(files_raw)?;
        let files = crate::parser::include_directive::split_include_files(&expanded)?;
        if self.standard == Standard::Posix2017 && files.len() != 1 {
            return Err(MakeError::OneIncludeFilePerLine);
        }
        for file in files {
            match std::fs::read_to_string(&file) {
                Ok(contents) => {
                    self.read_text_at_depth(&contents, Some(file), false, include_depth + 1)?;
                }
                Err(_) if !force => {
                    // `-include`: a missing file is a warning, not fatal.
                }
                Err(e) => return Err(MakeError::CantOpen(file, e.to_string())),
            }
        }
        Ok(())
    }

    fn handle_assignment(&mut self, name: &str, op: AssignOp, value: &str, is_builtin: bool) -> Result<(), MakeError> {
        let expanded_name = self.expand(name)?;
        let expanded_name = expanded_name.trim().to_string();
        if !validate_macro_name(&expanded_name) {
            return Err(MakeError::InvalidMacroName(expanded_name));
        }
        let level = self.makefile_level(is_builtin);
        let auto = AutomaticMacros::default();
        apply_assignment(&mut self.macros, &auto, &expanded_name, op, value, level)
    }

    fn handle_rule_line(&mut self, text: &str, pos: SourcePos, cmd_lines: Vec<(String, SourcePos)>) -> Result<(), MakeError> {
        let expanded = self.expand(text)?;
        let parsed = parse_rule_line(&expanded)?;

        if parsed.targets.len() == 1 && parsed.targets[0] == special::PRAGMA {
            for token in &parsed.prereqs {
                self.apply_pragma_word(token);
            }
            return Ok(());
        }

        let suffixes = suffix_list(&self.names, &self.rules);
        let target_types: Vec<TargetType> = parsed
            .targets
            .iter()
            .map(|t| classify_target_type(t, &suffixes))
            .collect();
        let seen_inference = target_types.iter().any(|t| *t == TargetType::Inference);
        if seen_inference {
            if self.standard.is_posix() && parsed.inline_cmd.is_some() {
                return Err(MakeError::ErrorInInferenceRule("'; command'".to_string()));
            }
            if parsed.targets.len() != 1 {
                return Err(MakeError::ErrorInInferenceRule("multiple targets".to_string()));
            }
        }

        let mut cmd_ids: Vec<CmdId> = Vec::new();
        if let Some(inline) = &parsed.inline_cmd {
            cmd_ids.push(self.rules.add_cmd(inline.clone(), pos.clone()));
        }
        for (cmd_text, cmd_pos) in cmd_lines {
            cmd_ids.push(self.rules.add_cmd(cmd_text, cmd_pos));
        }

        let dep_ids: Vec<NameId> = parsed
            .prereqs
            .iter()
            .map(|p| self.intern_prereq(p))
            .collect::<Result<_, _>>()?;

        for target_text in &parsed.targets {
            self.attach_rule(target_text, &dep_ids, &cmd_ids, parsed.double_colon, &pos)?;
        }
        Ok(())
    }

    fn apply_pragma_word(&mut self, word: &str) {
        if word == "posix_202x" {
            if self.standard.is_posix() {
                self.standard = Standard::Posix2024;
            }
            return;
        }
        self.pragma.apply(word);
    }

    fn intern_prereq(&mut self, token: &str) -> Result<NameId, MakeError> {
        if !validate_target_name(token, self.standard, &self.pragma) {
            return Err(MakeError::InvalidTargetName(token.to_string()));
        }
        Ok(self.names.intern(token))
    }

    /// Attach one rule body to `target_text`, following `target.c`'s
    /// `addrule` precisely: a special target declared with neither
    /// prerequisites nor commands clears its existing rules (except
    /// `.PHONY`, which is simply a no-op in that case); redefining
    /// commands for a not-yet-doubled target is an error unless the
    /// target is special with no new prerequisites (inference-rule
    /// redefinition), in which case the old commands are replaced.
    fn attach_rule(
        &mut self,
        target_text: &str,
        deps: &[NameId],
        cmds: &[CmdId],
        double_colon: bool,
        pos: &SourcePos,
    ) -> Result<(), MakeError> {
        if !validate_target_name(target_text, self.standard, &self.pragma) {
            return Err(MakeError::InvalidTargetName(target_text.to_string()));
        }
        let target_id = self.names.intern_target(target_text)?;
        let is_special_target = special::is_special(target_text);
        if is_special_target {
            self.names.get_mut(target_id).flags.insert(NameFlags::SPECIAL);
        }

        let already_target = self.names.get(target_id).flags.contains(NameFlags::TARGET);
        let is_double_flag = self.names.get(target_id).flags.contains(NameFlags::DOUBLE);
        if self.standard.allows_non_posix_extensions() && already_target && is_double_flag != double_colon {
            return Err(MakeError::InconsistentRules(target_text.to_string()));
        }

        if is_special_target && deps.is_empty() && cmds.is_empty() {
            if target_text == special::PHONY {
                return Ok(());
            }
            self.names.get_mut(target_id).rules.clear();
            return Ok(());
        }

        let has_cmds_already = self
            .names
            .get(target_id)
            .rules
            .iter()
            .any(|&rid| !self.rules.rule(rid).cmds.is_empty());
        if !cmds.is_empty() && !is_double_flag && has_cmds_already {
            if is_special_target && deps.is_empty() {
                self.names.get_mut(target_id).rules.clear();
            } else {
                return Err(MakeError::CommandsDefinedTwice(target_text.to_string()));
            }
        }

        let rule_id = self.rules.add_rule(Rule {
            deps: deps.to_vec(),
            cmds: cmds.to_vec(),
            double_colon,
            pos: pos.clone(),
        });
        self.names.get_mut(target_id).rules.push(rule_id);
        self.names.get_mut(target_id).flags.insert(NameFlags::TARGET);
        if double_colon {
            self.names.get_mut(target_id).flags.insert(NameFlags::DOUBLE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_rule_attaches_and_builds_dep_list() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text("foo.o: foo.c\n\tcc -c foo.c\n", Some("Makefile".to_string()), false)
            .unwrap();
        let foo_o = e.names.find("foo.o").unwrap();
        assert_eq!(e.names.get(foo_o).rules.len(), 1);
        let rule = e.rules.rule(e.names.get(foo_o).rules[0]);
        assert_eq!(rule.cmds.len(), 1);
        assert_eq!(e.rules.cmd(rule.cmds[0]).text, "cc -c foo.c");
    }

    #[test]
    fn recursive_macro_expands_at_use() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text("CC = gcc\nall: ; $(CC) -v\n", None, false).unwrap();
        assert_eq!(e.macros.value("CC"), "gcc");
    }

    #[test]
    fn phony_marks_prerequisites() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text(".PHONY: clean\nclean:\n\trm -rf build\n", None, false)
            .unwrap();
        e.finish(false, false, false);
        let clean = e.names.find("clean").unwrap();
        assert!(e.names.get(clean).flags.contains(NameFlags::PHONY));
    }

    #[test]
    fn bare_silent_sets_global_flag() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text(".SILENT:\nall:\n\techo hi\n", None, false).unwrap();
        e.finish(false, false, false);
        assert!(e.silent_global);
    }

    #[test]
    fn double_colon_mixed_with_single_is_an_error() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text("foo: a\nfoo:: b\n", None, false).unwrap_err();
    }

    #[test]
    fn commands_defined_twice_is_an_error() {
        let mut e = Engine::new(Standard::Extended, false);
        let err = e.read_text("foo:\n\techo a\nfoo:\n\techo b\n", None, false);
        assert!(err.is_err());
    }

    #[test]
    fn ifdef_skips_inactive_branch() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text("ifdef UNSET\nBAD = 1\nelse\nGOOD = 1\nendif\n", None, false)
            .unwrap();
        assert!(!e.macros.contains("BAD"));
        assert_eq!(e.macros.value("GOOD"), "1");
    }

    #[test]
    fn include_missing_file_is_fatal_without_dash() {
        let mut e = Engine::new(Standard::Extended, false);
        let err = e.read_text("include /no/such/file.mk\n", None, false);
        assert!(err.is_err());
    }

    #[test]
    fn else_ifdef_chain_picks_matching_branch() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text(
            "BAR = 1\nifdef FOO\nA = 1\nelse ifdef BAR\nB = 1\nelse\nC = 1\nendif\n",
            None,
            false,
        )
        .unwrap();
        assert!(!e.macros.contains("A"));
        assert_eq!(e.macros.value("B"), "1");
        assert!(!e.macros.contains("C"));
    }

    #[test]
    fn dash_include_missing_file_is_tolerated() {
        let mut e = Engine::new(Standard::Extended, false);
        e.read_text("-include /no/such/file.mk\nall:\n\techo hi\n", None, false)
            .unwrap();
    }
}
