use crate::error::MakeError;
use crate::pragma::Standard;

use super::shell::{run_shell, ShellResult};

/// Global option state that affects how every command line is handled,
/// independent of the per-line `@`/`-`/`+` prefixes or a target's
/// `.SILENT`/`.IGNORE` membership. `-q` is handled one level up, in the
/// evaluator, which never calls this function at all under `-q`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions<'a> {
    pub silent: bool,
    pub ignore_errors: bool,
    /// `-n`: print commands without running them.
    pub pretend: bool,
    /// `-t`: touch targets instead of running their recipe.
    pub touch: bool,
    pub shell: &'a str,
    pub standard: Standard,
}

/// Strip the leading `@`/`-`/`+` prefix characters a command line may
/// carry, in any order, per `make.c`'s `docmds`. Must run on the
/// already-macro-expanded text (spec.md §4.8 step 1 before step 2): a
/// recipe line built from a macro, e.g. `$(Q)echo hi` with `Q` bound to
/// `@`, only exposes its leading `@` once `$(Q)` has been substituted.
fn strip_cmd_prefixes(line: &str) -> (bool, bool, bool, String) {
    let mut silent = false;
    let mut ignore = false;
    let mut force = false;
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.chars().next() {
            Some('@') => {
                silent = true;
                rest = &trimmed[1..];
            }
            Some('-') => {
                ignore = true;
                rest = &trimmed[1..];
            }
            Some('+') => {
                force = true;
                rest = &trimmed[1..];
            }
            _ => {
                rest = trimmed;
                break;
            }
        }
    }
    (silent, ignore, force, rest.to_string())
}

/// Run one already macro-expanded command line, honoring its leading
/// `@`/`-`/`+` prefixes plus the target-level `.SILENT`/`.IGNORE` flags
/// and the global `-n`/`-t` options. Returns whether the shell was
/// actually invoked (the caller uses this to decide whether anything
/// "ran" for the target). Grounded line-by-line on `make.c`'s `docmds`.
pub fn run_command(
    expanded_text: &str,
    target_silent: bool,
    target_ignore: bool,
    opts: &CommandOptions,
) -> Result<bool, MakeError> {
    let (cmd_silent, cmd_ignore, cmd_force, text) = strip_cmd_prefixes(expanded_text);

    let mut ssilent = opts.silent || target_silent || opts.touch;
    let mut signore = opts.ignore_errors || target_ignore;
    let mut sdomake = !opts.pretend && !opts.touch;

    if cmd_silent {
        ssilent = true;
    }
    if cmd_ignore {
        signore = true;
    }
    if cmd_force {
        sdomake = true;
    }

    if cmd_force {
        // '+' must not override '@' or target .SILENT.
        if !cmd_silent && !target_silent {
            ssilent = false;
        }
    } else if !sdomake {
        ssilent = opts.touch;
    }

    if !ssilent {
        println!("{}", text);
    }

    if !sdomake {
        return Ok(false);
    }

    // Per spec.md §9 "Shell invocation": prepend `set -e;` only when not
    // ignoring errors and POSIX mode is in effect, so a multi-statement
    // command line fails on its first error rather than its last.
    let shell_text = if opts.standard.is_posix() && !signore {
        format!("set -e;{}", text)
    } else {
        text.clone()
    };

    match run_shell(opts.shell, &shell_text)? {
        ShellResult::Exited(0) => Ok(true),
        ShellResult::Exited(code) => {
            if signore {
                Ok(true)
            } else {
                Err(MakeError::FailedExit(text.clone(), code))
            }
        }
        ShellResult::Signaled(sig) => {
            if signore {
                Ok(true)
            } else {
                Err(MakeError::FailedSignal(text.clone(), sig))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_combine_in_any_order() {
        let (silent, ignore, force, text) = strip_cmd_prefixes("  -@echo hi");
        assert!(silent);
        assert!(ignore);
        assert!(!force);
        assert_eq!(text, "echo hi");
    }
}
