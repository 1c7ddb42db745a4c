use std::collections::HashMap;
use std::process::Command as ProcessCommand;

use crate::command::{run_command, CommandOptions};
use crate::dyndep::find_inference;
use crate::error::MakeError;
use crate::expand::Expander;
use crate::graph::{CmdId, RuleArena, RuleId};
use crate::pragma::Standard;
use crate::symtab::{MacroTable, ModTime, NameFlags, NameId, NameTable};

use super::bind_automatic_macros;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub pretend: bool,
    pub touch: bool,
    pub question: bool,
    pub keep_going: bool,
    pub ignore_errors: bool,
    pub silent: bool,
    pub standard: Standard,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOutcome {
    /// Whether anything was (or, under `-q`, would be) rebuilt.
    pub out_of_date: bool,
    /// Whether a command block actually ran (or was echoed/touched) for
    /// this target. Used at `level == 0` to decide whether to print
    /// `'target' is up to date`, per `make.c`'s `didsomething`.
    pub ran: bool,
}

pub struct BuildContext<'a> {
    pub names: &'a mut NameTable,
    pub rules: &'a RuleArena,
    pub macros: &'a mut MacroTable,
    pub opts: &'a BuildOptions,
    pub shell: String,
    /// Program name used in "`'target' is up to date`" messages, taken
    /// from `argv[0]`'s basename.
    pub myname: String,
    /// Caches each name's already-computed up-to-date outcome, so a
    /// prerequisite shared by several targets is only evaluated once per
    /// run, matching the original's `N_DONE` flag.
    done: HashMap<NameId, BuildOutcome>,
    /// Set once any rule fails under `-k`, so the top-level caller can
    /// still report a nonzero exit status after finishing everything it
    /// can.
    pub any_failed: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        names: &'a mut NameTable,
        rules: &'a RuleArena,
        macros: &'a mut MacroTable,
        opts: &'a BuildOptions,
    ) -> Self {
        let shell = macros.value("SHELL").to_string();
        BuildContext {
            names,
            rules,
            macros,
            opts,
            shell,
            myname: "make".to_string(),
            done: HashMap::new(),
            any_failed: false,
        }
    }

    pub fn with_myname(mut self, myname: impl Into<String>) -> Self {
        self.myname = myname.into();
        self
    }

    fn mtime(&mut self, id: NameId) -> Result<ModTime, MakeError> {
        if let Some(m) = self.names.get(id).mtime {
            return Ok(m);
        }
        let name = self.names.get(id).name.clone();
        let m = crate::modtime::probe(&name)?;
        self.names.get_mut(id).mtime = Some(m);
        Ok(m)
    }

    fn invalidate_mtime(&mut self, id: NameId) {
        self.names.get_mut(id).mtime = None;
    }

    /// Called once a target has actually been (conceptually) rebuilt: the
    /// cached mtime is dropped and re-probed, falling back to the current
    /// wall-clock time if the target still has no file backing it (a
    /// phony target, or a rule with no recipe of its own), per
    /// `make.c`'s `time(&np->n_time)` after a successful `make1`.
    fn mark_rebuilt(&mut self, id: NameId) -> Result<(), MakeError> {
        self.invalidate_mtime(id);
        if self.mtime(id)?.is_unknown() {
            let now = wall_clock_mtime();
            self.names.get_mut(id).mtime = Some(now);
        }
        Ok(())
    }
}

fn wall_clock_mtime() -> ModTime {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    ModTime {
        sec: now.as_secs() as i64,
        nsec: now.subsec_nanos() as i64,
    }
}

/// Recursively make `target` up to date: build its prerequisites first,
/// then (if out of date) run its recipe. Grounded on `make.c`'s `make`.
pub fn make(ctx: &mut BuildContext, target: NameId, level: u32) -> Result<BuildOutcome, MakeError> {
    if let Some(outcome) = ctx.done.get(&target) {
        return Ok(*outcome);
    }

    let flags = ctx.names.get(target).flags;
    if flags.contains(NameFlags::DOING) {
        return Err(MakeError::CircularDependency(ctx.names.get(target).name.clone()));
    }
    ctx.names.get_mut(target).flags.insert(NameFlags::DOING);

    let outcome = make_inner(ctx, target, level);

    ctx.names.get_mut(target).flags.remove(NameFlags::DOING);
    ctx.names.get_mut(target).flags.insert(NameFlags::DONE);

    match outcome {
        Ok(o) => {
            ctx.done.insert(target, o);
            Ok(o)
        }
        Err(e) => {
            if ctx.opts.keep_going && e.is_build_failure() {
                ctx.any_failed = true;
                let o = BuildOutcome {
                    out_of_date: true,
                    ran: false,
                };
                ctx.done.insert(target, o);
                Ok(o)
            } else {
                Err(e)
            }
        }
    }
}

fn make_inner(ctx: &mut BuildContext, target: NameId, level: u32) -> Result<BuildOutcome, MakeError> {
    let rule_ids = ctx.names.get(target).rules.clone();
    let is_phony = ctx.names.get(target).flags.contains(NameFlags::PHONY);

    if rule_ids.is_empty() {
        return make_without_explicit_rule(ctx, target, level, is_phony);
    }

    let is_double = ctx.names.get(target).flags.contains(NameFlags::DOUBLE);

    let outcome = if is_double {
        // Each `::` rule attached to the target is evaluated on its own,
        // with its own prerequisite list and its own recipe.
        let mut out_of_date = false;
        let mut ran = false;
        for rule_id in rule_ids {
            let rule = ctx.rules.rule(rule_id).clone();
            let result = run_one_rule(
                ctx,
                target,
                rule.deps.clone(),
                rule.deps,
                rule.cmds,
                true,
                None,
                None,
                level,
                is_phony,
            )?;
            out_of_date |= result.out_of_date;
            ran |= result.ran;
        }
        BuildOutcome { out_of_date, ran }
    } else {
        // Single-colon: every `target: deps` line contributes to one
        // combined prerequisite list, but only one recipe runs. Mirrors
        // `make.c`'s `getcmd` walking the whole rule chain for a command
        // list while the surrounding loop accumulates `newer`/`dtime`
        // from every rule's dependencies. `merged_deps` is cross-rule
        // deduplicated (drives the out-of-date/`$^` computation and the
        // recursive `make()` calls); `raw_deps` keeps every repeat,
        // including ones written twice on the same rule line, since `$+`
        // must reflect them (spec.md §4.7).
        let mut merged_deps = Vec::new();
        let mut raw_deps = Vec::new();
        let mut cmds = Vec::new();
        for rule_id in &rule_ids {
            let rule = ctx.rules.rule(*rule_id);
            for &dep in &rule.deps {
                raw_deps.push(dep);
                if !merged_deps.contains(&dep) {
                    merged_deps.push(dep);
                }
            }
            if cmds.is_empty() && !rule.cmds.is_empty() {
                cmds = rule.cmds.clone();
            }
        }

        let mut implicit = None;
        let mut stem = None;
        if cmds.is_empty() {
            if let Some(m) = find_inference(ctx.names, ctx.rules, ctx.opts.standard, target)? {
                let inferred = ctx.rules.rule(m.rule).clone();
                cmds = inferred.cmds;
                for &dep in &inferred.deps {
                    raw_deps.push(dep);
                    if !merged_deps.contains(&dep) {
                        merged_deps.push(dep);
                    }
                }
                implicit = Some(m.implicit_prereq);
                stem = Some(m.stem);
            }
        }

        run_one_rule(ctx, target, merged_deps, raw_deps, cmds, false, implicit, stem, level, is_phony)?
    };

    if level == 0 && !outcome.ran && !ctx.opts.question {
        println!("{}: '{}' is up to date", ctx.myname, ctx.names.get(target).name);
    }
    Ok(outcome)
}

fn make_without_explicit_rule(
    ctx: &mut BuildContext,
    target: NameId,
    level: u32,
    is_phony: bool,
) -> Result<BuildOutcome, MakeError> {
    let inferred = find_inference(ctx.names, ctx.rules, ctx.opts.standard, target)?;
    let outcome = match inferred {
        Some(m) => {
            let rule = ctx.rules.rule(m.rule).clone();
            run_one_rule(
                ctx,
                target,
                rule.deps.clone(),
                rule.deps,
                rule.cmds,
                false,
                Some(m.implicit_prereq),
                Some(m.stem),
                level,
                is_phony,
            )?
        }
        None => {
            let mtime = ctx.mtime(target)?;
            if mtime.is_unknown() && !is_phony {
                if let Some(default_rule) = default_rule(ctx.names) {
                    let rule = ctx.rules.rule(default_rule).clone();
                    run_one_rule(
                        ctx,
                        target,
                        rule.deps.clone(),
                        rule.deps,
                        rule.cmds,
                        false,
                        Some(target),
                        None,
                        level,
                        is_phony,
                    )?
                } else {
                    return Err(MakeError::DontKnowHowToMake(ctx.names.get(target).name.clone()));
                }
            } else {
                BuildOutcome {
                    out_of_date: is_phony,
                    ran: false,
                }
            }
        }
    };
    if level == 0 && !outcome.ran && !ctx.opts.question {
        println!("{}: '{}' is up to date", ctx.myname, ctx.names.get(target).name);
    }
    Ok(outcome)
}

/// The first rule attached to `.DEFAULT`, used as a last-resort recipe
/// when neither an explicit rule nor an inference rule applies, per
/// `make.c`'s fallback to `getcmd(findname(".DEFAULT"))`.
fn default_rule(names: &NameTable) -> Option<RuleId> {
    let id = names.find(crate::graph::special::DEFAULT)?;
    names.get(id).rules.first().copied()
}

/// Evaluate a single rule body attached to `target`: the deps/cmds come
/// pre-merged from `make_inner` for a single-colon target, or straight
/// from one `::` rule for a double-colon target. `implicit`/`stem` come
/// from an inference match when the commands were synthesized by
/// `dyndep`. A rule with no commands at all (no recipe of its own and no
/// inference match) still counts as "ran" once it's out of date, since
/// `make.c`'s `make1`/`docmds` run (doing nothing) even when `sc_cmd` is
/// NULL — what matters for `didsomething` is whether a rebuild was
/// needed, not whether it had anything to execute.
fn run_one_rule(
    ctx: &mut BuildContext,
    target: NameId,
    deps: Vec<NameId>,
    raw_deps: Vec<NameId>,
    cmds: Vec<CmdId>,
    double_colon: bool,
    implicit: Option<NameId>,
    stem: Option<String>,
    level: u32,
    is_phony: bool,
) -> Result<BuildOutcome, MakeError> {
    let mut deps = deps;
    let mut raw_deps = raw_deps;
    if let Some(imp) = implicit {
        if !deps.contains(&imp) {
            deps.push(imp);
        }
        raw_deps.push(imp);
    }

    let mut newer = Vec::new();
    let target_mtime = ctx.mtime(target)?;

    for &dep in &deps {
        make(ctx, dep, level + 1)?;
        let dep_mtime = ctx.mtime(dep)?;
        if target_mtime.is_unknown() || target_mtime <= dep_mtime {
            newer.push(dep);
        }
    }

    // A `::` rule with no prerequisites at all is executed unconditionally,
    // per `make.c`'s `if (!rp->r_dep) dtime = np->n_time;` (comparing the
    // target's mtime against itself always succeeds).
    let out_of_date =
        target_mtime.is_unknown() || is_phony || !newer.is_empty() || (double_colon && deps.is_empty());

    if !out_of_date {
        return Ok(BuildOutcome {
            out_of_date: false,
            ran: false,
        });
    }

    // `-q` never reaches the recipe at all: no echo, no execution, no
    // touch. Matches `make.c`'s early `if (quest) { ...; return 1; }`
    // before `make1`/`docmds` are ever called.
    if ctx.opts.question {
        return Ok(BuildOutcome {
            out_of_date: true,
            ran: false,
        });
    }

    let target_flags = ctx.names.get(target).flags;
    let target_silent = target_flags.contains(NameFlags::SILENT);
    let target_ignore = target_flags.contains(NameFlags::IGNORE);
    // `remove_target` on signal death is suppressed for precious/phony
    // targets, and also under `-n`/`-t` where nothing is genuinely being
    // rebuilt from scratch (per spec.md §8, scenario 8 / §4.8 point 5).
    let precious = target_flags.contains(NameFlags::PRECIOUS)
        || is_phony
        || ctx.opts.pretend
        || ctx.opts.touch;

    let auto = bind_automatic_macros(ctx.names, target, &raw_deps, &newer, implicit, stem.as_deref());
    let target_path = ctx.names.get(target).name.clone();
    crate::signals::set_current_target(Some(&target_path), precious);

    let cmd_opts = CommandOptions {
        silent: ctx.opts.silent,
        ignore_errors: ctx.opts.ignore_errors,
        pretend: ctx.opts.pretend,
        touch: ctx.opts.touch,
        shell: &ctx.shell,
        standard: ctx.opts.standard,
    };

    let mut ran_any_real_command = false;
    for &cmd_id in &cmds {
        let raw_text = ctx.rules.cmd(cmd_id).text.clone();
        let expanded_text = Expander::new(ctx.macros, &auto).expand(&raw_text)?;

        let executed = run_command(&expanded_text, target_silent, target_ignore, &cmd_opts)?;
        if executed {
            ran_any_real_command = true;
        }
    }

    if ctx.opts.touch && !is_phony {
        if ctx.opts.pretend || !ctx.opts.silent {
            println!("touch {}", target_path);
        }
        if !ctx.opts.pretend {
            let _ = ProcessCommand::new("touch").arg(&target_path).status();
        }
    }

    crate::signals::set_current_target(None, false);
    if !ctx.opts.pretend || ran_any_real_command {
        ctx.mark_rebuilt(target)?;
    }

    Ok(BuildOutcome {
        out_of_date: true,
        ran: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Rule, RuleArena};

    #[test]
    fn phony_target_is_always_out_of_date() {
        let mut names = NameTable::new();
        let rules = RuleArena::new();
        let mut macros = MacroTable::new();
        macros.set("SHELL", "/bin/sh", 0, true);
        let opts = BuildOptions {
            question: true,
            ..Default::default()
        };

        let t = names.intern_target("clean").unwrap();
        names.get_mut(t).flags.insert(NameFlags::PHONY);

        let mut ctx = BuildContext::new(&mut names, &rules, &mut macros, &opts);
        let outcome = make(&mut ctx, t, 0).unwrap();
        assert!(outcome.out_of_date);
    }

    #[test]
    fn commandless_target_still_counts_as_ran_when_out_of_date() {
        let mut names = NameTable::new();
        let mut rules = RuleArena::new();
        let mut macros = MacroTable::new();
        macros.set("SHELL", "/bin/sh", 0, true);
        let opts = BuildOptions::default();

        let dep = names.intern_target("clean").unwrap();
        names.get_mut(dep).flags.insert(NameFlags::PHONY);
        let all = names.intern_target("all").unwrap();
        let rule_id = rules.add_rule(Rule {
            deps: vec![dep],
            cmds: vec![],
            double_colon: false,
            pos: crate::error::SourcePos::default(),
        });
        names.get_mut(all).rules.push(rule_id);
        names.get_mut(all).flags.insert(NameFlags::TARGET);

        let mut ctx = BuildContext::new(&mut names, &rules, &mut macros, &opts);
        let outcome = make(&mut ctx, all, 0).unwrap();
        assert!(outcome.out_of_date);
        assert!(outcome.ran);
    }

    #[test]
    fn single_colon_merges_prerequisites_from_every_rule_line() {
        let mut names = NameTable::new();
        let mut rules = RuleArena::new();
        let mut macros = MacroTable::new();
        macros.set("SHELL", "/bin/sh", 0, true);
        let opts = BuildOptions::default();

        let a = names.intern_target("a").unwrap();
        let b = names.intern_target("b").unwrap();
        let all = names.intern_target("all").unwrap();
        let deps_only = rules.add_rule(Rule {
            deps: vec![a],
            cmds: vec![],
            double_colon: false,
            pos: crate::error::SourcePos::default(),
        });
        let with_cmd = rules.add_rule(Rule {
            deps: vec![b],
            cmds: vec![],
            double_colon: false,
            pos: crate::error::SourcePos::default(),
        });
        names.get_mut(all).rules.push(deps_only);
        names.get_mut(all).rules.push(with_cmd);
        names.get_mut(all).flags.insert(NameFlags::TARGET);
        names.get_mut(a).flags.insert(NameFlags::PHONY);
        names.get_mut(b).flags.insert(NameFlags::PHONY);

        let mut ctx = BuildContext::new(&mut names, &rules, &mut macros, &opts);
        let outcome = make(&mut ctx, all, 0).unwrap();
        // Both `a` and `b` are phony, so `all` is out of date purely from
        // aggregating every single-colon rule line's prerequisites.
        assert!(outcome.out_of_date);
        assert!(outcome.ran);
    }
}
