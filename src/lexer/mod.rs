//! Line reading: physical-to-logical line joining, a virtual built-in-
//! rules source, and the conditional-directive stack.
//!
//! Grounded on `input.c`'s `readline`/`make_fgets`/`skip_line`. See
//! DESIGN.md "Line reader & lexer (C3)".

mod builtin_source;
mod conditional;
mod reader;

pub use builtin_source::builtin_rules_text;
pub use conditional::{ConditionalStack, Directive};
pub use reader::{LineReader, LogicalLine};
