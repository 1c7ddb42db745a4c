use std::process::Command;

use crate::error::MakeError;
use crate::expand::{AutomaticMacros, Expander};
use crate::symtab::MacroTable;

use super::line_class::AssignOp;

/// Apply one macro assignment line, per `macro.c`'s `setmacro` plus the
/// POSIX 2024 `+=`/`?=`/`!=` extensions. `level` is the precedence level
/// new bindings are created at (4 for makefile text, see
/// `symtab::MacroTable::set`).
pub fn apply_assignment(
    macros: &mut MacroTable,
    auto: &AutomaticMacros,
    name: &str,
    op: AssignOp,
    raw_value: &str,
    level: u8,
) -> Result<(), MakeError> {
    match op {
        AssignOp::Recursive => {
            macros.set(name, raw_value, level, false);
        }
        AssignOp::Immediate | AssignOp::ImmediatePosix => {
            let expanded = Expander::new(macros, auto).expand(raw_value)?;
            macros.set(name, &expanded, level, true);
        }
        AssignOp::ImmediateEscaped => {
            // Expanded once now (capturing nested macros' current
            // values), but stored as a *delayed* macro: the surviving
            // literal `$$` only collapses to `$` the next time this
            // macro is itself expanded, per spec.md §4.4 point 3's
            // "mark delayed".
            let expanded = Expander::new_preserving_dollar_dollar(macros, auto).expand(raw_value)?;
            macros.set(name, &expanded, level, false);
        }
        AssignOp::Append => {
            let existing_immediate = macros.get(name).map(|m| m.immediate).unwrap_or(false);
            if existing_immediate {
                let expanded = Expander::new(macros, auto).expand(raw_value)?;
                macros.append(name, &expanded, level);
            } else {
                macros.append(name, raw_value, level);
            }
        }
        AssignOp::Conditional => {
            if !macros.contains(name) {
                macros.set(name, raw_value, level, false);
            }
        }
        AssignOp::Shell => {
            let expanded = Expander::new(macros, auto).expand(raw_value)?;
            let output = Command::new("sh")
                .arg("-c")
                .arg(&expanded)
                .output()
                .map_err(|e| MakeError::Other(format!("!= assignment failed: {}", e)))?;
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            if text.ends_with('\n') {
                text.pop();
            }
            let collapsed = text.replace('\n', " ");
            macros.set(name, &collapsed, level, true);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_only_sets_once() {
        let mut m = MacroTable::new();
        let auto = AutomaticMacros::default();
        apply_assignment(&mut m, &auto, "X", AssignOp::Conditional, "1", 4).unwrap();
        apply_assignment(&mut m, &auto, "X", AssignOp::Conditional, "2", 4).unwrap();
        assert_eq!(m.value("X"), "1");
    }

    #[test]
    fn append_to_undefined_creates_deferred() {
        let mut m = MacroTable::new();
        let auto = AutomaticMacros::default();
        apply_assignment(&mut m, &auto, "X", AssignOp::Append, "a", 4).unwrap();
        apply_assignment(&mut m, &auto, "X", AssignOp::Append, "b", 4).unwrap();
        assert_eq!(m.value("X"), "a b");
    }

    #[test]
    fn immediate_escaped_preserves_literal_dollar_dollar() {
        let mut m = MacroTable::new();
        let auto = AutomaticMacros::default();
        m.set("HOME", "nope", 4, false);
        apply_assignment(&mut m, &auto, "X", AssignOp::ImmediateEscaped, "$$HOME $(HOME)", 4).unwrap();
        assert_eq!(m.value("X"), "$$HOME nope");
        assert!(!m.get("X").unwrap().immediate);
    }
}
