//! Command execution: per-line prefix handling, shell invocation, and
//! exit/signal classification.
//!
//! Grounded on `make.c`'s `docmds`. See DESIGN.md "Command runner (C8)".

mod runner;
mod shell;

pub use runner::{run_command, CommandOptions};
pub use shell::ShellResult;
