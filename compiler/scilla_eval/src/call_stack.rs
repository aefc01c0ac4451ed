//! Component call trail for error attribution.
//!
//! The dispatcher pushes the selected transition and every procedure call
//! pushes the callee. When a statement fails, the trail is snapshotted into
//! an `EvalBacktrace` on the error.

use scilla_ir::{Name, Span};
use scilla_value::{BacktraceFrame, EvalBacktrace, EvalError};

/// One active transition or procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentFrame {
    pub name: Name,
    /// Span of the call statement; `None` for the transition itself.
    pub call_span: Option<Span>,
}

/// Live component stack of one message run.
#[derive(Clone, Debug, Default)]
pub struct ComponentStack {
    frames: Vec<ComponentFrame>,
}

impl ComponentStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Name, call_span: Option<Span>) {
        self.frames.push(ComponentFrame { name, call_span });
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "ComponentStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Snapshot, innermost first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: f.name.to_string(),
                span: f.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach the current trail unless the error already carries one.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scilla_value::errors::unbound_identifier;

    #[test]
    fn capture_is_innermost_first() {
        let mut stack = ComponentStack::new();
        stack.push(Name::new("Transfer"), None);
        stack.push(Name::new("Debit"), Some(Span::new(4, 9)));
        assert_eq!(stack.capture().names(), vec!["Debit", "Transfer"]);
        stack.pop();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn first_attached_trail_wins() {
        let mut stack = ComponentStack::new();
        stack.push(Name::new("Outer"), None);
        stack.push(Name::new("Inner"), None);
        let err = stack.attach_backtrace(unbound_identifier("x"));
        stack.pop();
        let err = stack.attach_backtrace(err);
        assert_eq!(
            err.backtrace.map(|b| b.len()),
            Some(2)
        );
    }

    #[test]
    fn empty_stack_leaves_error_alone() {
        let err = ComponentStack::new().attach_backtrace(unbound_identifier("x"));
        assert!(err.backtrace.is_none());
    }
}
