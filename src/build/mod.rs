//! The build evaluator: recursive `make()`, automatic-macro binding, and
//! the `-q`/`-n`/`-t`/`-k`/`-S`/`-i` option semantics.
//!
//! Grounded on `make.c`'s `make`/`make1`. See DESIGN.md "Build evaluator
//! (C7)".

mod automatic_macros;
mod evaluator;

pub use automatic_macros::bind_automatic_macros;
pub use evaluator::{make, BuildContext, BuildOptions, BuildOutcome};
