//! Error types
//!
//! One `thiserror` enum per the diagnostic taxonomy in the specification:
//! syntax, semantic, reference, I/O and build errors. All fatal errors
//! eventually reach the top-level handler in `main.rs`, which prints
//! `myname: (file:line): message` and exits with status 2.

use std::fmt;

use thiserror::Error;

/// Position within a makefile, for diagnostics. `file: None` means the
/// built-in rules or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePos {
    pub file: Option<String>,
    pub line: u32,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line),
            None => write!(f, "<builtin>"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MakeError {
    // --- Syntax ---
    #[error("expected separator")]
    ExpectedSeparator,
    #[error("unterminated variable '{0}'")]
    UnterminatedVariable(String),
    #[error("invalid macro assignment")]
    InvalidMacroAssignment,
    #[error("missing conditional")]
    MissingConditional,
    #[error("unexpected {0}")]
    Unexpected(String),
    #[error("nesting too deep")]
    NestingTooDeep,
    #[error("invalid condition")]
    InvalidCondition,
    #[error("{0} in inference rule")]
    ErrorInInferenceRule(String),
    #[error("command not allowed here")]
    CommandNotAllowedHere,
    #[error("missing separator")]
    MissingSeparator,
    #[error("one include file per line")]
    OneIncludeFilePerLine,
    #[error("no include file")]
    NoIncludeFile,
    #[error("too many includes")]
    TooManyIncludes,
    #[error("invalid conditional")]
    InvalidConditionalNesting,
    #[error("empty suffix{0}")]
    EmptySuffix(String),

    // --- Semantic ---
    #[error("inconsistent rules for target {0}")]
    InconsistentRules(String),
    #[error("commands defined twice for target {0}")]
    CommandsDefinedTwice(String),
    #[error("circular dependency for {0}")]
    CircularDependency(String),
    #[error("don't know how to make {0}")]
    DontKnowHowToMake(String),

    // --- Reference ---
    #[error("recursive macro {0}")]
    RecursiveMacro(String),
    #[error("invalid target name '{0}'")]
    InvalidTargetName(String),
    #[error("invalid macro name '{0}'")]
    InvalidMacroName(String),
    #[error("invalid name '{0}'")]
    InvalidName(String),

    // --- I/O ---
    #[error("can't open include file '{0}'")]
    CantOpenIncludeFile(String),
    #[error("can't open {0}: {1}")]
    CantOpen(String, String),
    #[error("glob error for '{0}'")]
    GlobError(String),
    #[error("{0}: not an archive")]
    NotAnArchive(String),
    #[error("invalid archive")]
    InvalidArchive,
    #[error("couldn't execute '{0}'")]
    CouldntExecute(String),
    #[error("no makefile found")]
    NoMakefileFound,
    #[error("invalid MAKEFLAGS")]
    InvalidMakeflags,
    #[error("no targets defined")]
    NoTargetsDefined,

    // --- Build ---
    #[error("failed to build '{0}' exit {1}")]
    FailedExit(String, i32),
    #[error("failed to build '{0}' signal {1}")]
    FailedSignal(String, i32),
    #[error("'{0}' not built due to errors")]
    NotBuiltDueToErrors(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("{0}")]
    Other(String),
}

impl MakeError {
    /// Whether this error is a build-failure warning rather than a hard
    /// stop; used by the `-k` continue-on-error path.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, MakeError::FailedExit(..) | MakeError::FailedSignal(..))
    }
}
