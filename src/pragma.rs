//! Conformance mode and `.PRAGMA` flags.
//!
//! Grounded on `make.h`'s `posix`/`ENABLE_FEATURE_MAKE_POSIX_202X` and
//! `input.c`'s handling of the `.PRAGMA` special target. See DESIGN.md
//! Open Question 1 for why this is three-way rather than the original's
//! single boolean.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Standard {
    /// No `--posix`: the full extension set (default, default-goal
    /// inference, double-colon rules, `:=`, conditionals, wildcards,
    /// chained inference, `lib(m1 m2)` spreading).
    #[default]
    Extended,
    /// `--posix` alone: bare POSIX.1-2017 `make`.
    Posix2017,
    /// `--posix` plus `-x posix_202x` (or `.PRAGMA: posix_202x`): adds
    /// `::=`, `:::=`, `+=`, `?=`, `!=`, `.PHONY`/`.NOTPARALLEL`/`.WAIT`,
    /// and the wider target-name character set, while still excluding the
    /// `Extended`-only features.
    Posix2024,
}

impl Standard {
    pub fn is_posix(&self) -> bool {
        !matches!(self, Standard::Extended)
    }

    pub fn allows_2024_extensions(&self) -> bool {
        matches!(self, Standard::Extended | Standard::Posix2024)
    }

    pub fn allows_non_posix_extensions(&self) -> bool {
        matches!(self, Standard::Extended)
    }
}

/// Flags set via `.PRAGMA: flag ...` lines in a makefile, per `input.c`.
/// `posix_202x` is handled as a `Standard` transition rather than stored
/// here, since it changes parsing behavior globally rather than toggling
/// one independent knob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pragma {
    /// Macro names may only be referenced with `$(NAME)`/`${NAME}`, never
    /// bare single-character `$X` forms.
    pub macro_name: bool,
    /// Target names may contain any character, not just the POSIX-
    /// restricted set.
    pub target_name: bool,
    /// `#` inside a command line starts a shell comment, not a makefile
    /// comment.
    pub command_comment: bool,
    /// An empty suffix (`.c.`) is accepted rather than rejected.
    pub empty_suffix: bool,
}

impl Pragma {
    pub fn apply(&mut self, word: &str) -> bool {
        match word {
            "macro_name" => self.macro_name = true,
            "target_name" => self.target_name = true,
            "command_comment" => self.command_comment = true,
            "empty_suffix" => self.empty_suffix = true,
            _ => return false,
        }
        true
    }
}
