//! Macro expansion: `$(VAR)`, `${VAR}`, `$X`, suffix replacement, pattern
//! substitution, and the `D`/`F` modifiers.
//!
//! Grounded on `input.c`'s `expand_macros`/`modify_words`/`skip_macro`.
//! See DESIGN.md "Macro expander (C2)".

mod expander;
mod modifiers;

pub use expander::{AutomaticMacros, Expander};
