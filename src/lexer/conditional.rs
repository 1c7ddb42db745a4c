use crate::error::MakeError;

/// Which conditional directive a line spells, independent of how its
/// condition (if any) is evaluated — that's the parser's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    If,
    Else,
    Endif,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// This branch's condition was true and no ancestor is inactive.
    active: bool,
    /// Some branch of this `if`/`else` chain has already been taken.
    taken: bool,
    /// An `else` has already been seen at this nesting level.
    seen_else: bool,
}

/// Tracks nested `.if`/`.ifdef`/`.else`/`.endif`-style conditional state
/// (an Extended feature; see SPEC_FULL.md §4). A line should be skipped
/// whenever `self.is_active()` is false.
#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<Frame>,
}

/// Per spec.md §4.3: "a bounded stack of at most 10 frames".
const MAX_NESTING: usize = 10;

impl ConditionalStack {
    pub fn new() -> Self {
        ConditionalStack::default()
    }

    pub fn is_active(&self) -> bool {
        self.frames.iter().all(|f| f.active)
    }

    /// Whether the *immediately enclosing* frame is active, ignoring its
    /// own `active` bit — used to decide if a new `if`'s condition should
    /// even be evaluated (short-circuiting side effects inside a
    /// disabled branch).
    fn parent_active(&self) -> bool {
        self.frames.len() < 2 || self.frames[..self.frames.len() - 1].iter().all(|f| f.active)
    }

    pub fn push_if(&mut self, condition: bool) -> Result<(), MakeError> {
        if self.frames.len() >= MAX_NESTING {
            return Err(MakeError::NestingTooDeep);
        }
        let parent_active = self.parent_active() && self.is_active();
        self.frames.push(Frame {
            active: parent_active && condition,
            taken: parent_active && condition,
            seen_else: false,
        });
        Ok(())
    }

    pub fn handle_else(&mut self, condition: Option<bool>) -> Result<(), MakeError> {
        let parent_active = self.parent_active();
        let frame = self.frames.last_mut().ok_or(MakeError::MissingConditional)?;
        if frame.seen_else && condition.is_none() {
            return Err(MakeError::InvalidConditionalNesting);
        }
        if condition.is_none() {
            frame.seen_else = true;
        }
        let cond = condition.unwrap_or(true);
        frame.active = parent_active && !frame.taken && cond;
        if frame.active {
            frame.taken = true;
        }
        Ok(())
    }

    pub fn pop_endif(&mut self) -> Result<(), MakeError> {
        if self.frames.pop().is_none() {
            return Err(MakeError::MissingConditional);
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_if_else_endif() {
        let mut s = ConditionalStack::new();
        s.push_if(false).unwrap();
        assert!(!s.is_active());
        s.handle_else(None).unwrap();
        assert!(s.is_active());
        s.pop_endif().unwrap();
        assert!(s.is_active());
    }

    #[test]
    fn nested_inactive_parent_stays_inactive() {
        let mut s = ConditionalStack::new();
        s.push_if(false).unwrap();
        s.push_if(true).unwrap();
        assert!(!s.is_active());
    }

    #[test]
    fn unmatched_endif_errors() {
        let mut s = ConditionalStack::new();
        assert!(s.pop_endif().is_err());
    }
}
