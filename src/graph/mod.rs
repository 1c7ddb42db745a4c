//! The dependency graph: rules, commands, and their arena storage.
//!
//! Grounded on `target.c`'s `struct rule`/`struct depend`/`struct cmd`.
//! Rather than the original's refcounted linked lists threaded through
//! `struct name`, rules and commands live in flat arenas indexed by
//! `u32` handles (`RuleId`/`CmdId`) — see DESIGN.md "Build evaluator
//! (C7)" for the rationale.

mod rule;
pub mod special;

pub use rule::{Cmd, CmdId, Rule, RuleArena, RuleId};
pub use special::{classify_target_type, TargetType};
