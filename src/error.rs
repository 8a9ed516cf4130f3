//! The single raise channel: three informational kinds, one propagation path.
//!
//! `try` catches any of the three; the distinction only affects how an
//! uncaught error is reported at the top level.

use thiserror::Error;

use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntactic problems in source text.
    Reader,
    /// Semantic problems during evaluation: unbound symbol, wrong arity,
    /// wrong argument type to a special form, calling a non-function.
    Eval,
    /// Catch-all for builtin failures: arithmetic overflow, bad types,
    /// missing map key, user `throw`, VM errors.
    Lisp,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Reader => "reader_error",
            ErrorKind::Eval => "eval_error",
            ErrorKind::Lisp => "lisp_error",
        }
    }
}

/// A raised value, carrying a call-stack snapshot for the debugger.
#[derive(Error, Debug, Clone)]
#[error("{}: {}", kind.label(), payload.repr())]
pub struct LispError {
    pub kind: ErrorKind,
    pub payload: Value,
    pub call_stack: Value,
}

impl LispError {
    pub fn new(kind: ErrorKind, payload: Value, call_stack: Value) -> LispError {
        LispError { kind, payload, call_stack }
    }

    pub fn reader_msg(msg: impl Into<String>) -> LispError {
        LispError::new(ErrorKind::Reader, Value::str(msg.into()), Value::Nil)
    }

    pub fn eval_msg(msg: impl Into<String>) -> LispError {
        LispError::new(ErrorKind::Eval, Value::str(msg.into()), Value::Nil)
    }

    pub fn lisp_msg(msg: impl Into<String>) -> LispError {
        LispError::new(ErrorKind::Lisp, Value::str(msg.into()), Value::Nil)
    }

    /// Attach a call-stack snapshot, used when an error bubbles up through
    /// the evaluator's trampoline.
    pub fn with_call_stack(mut self, call_stack: Value) -> LispError {
        if self.call_stack.is_nil() {
            self.call_stack = call_stack;
        }
        self
    }

    /// The message printed at the top level on an uncaught error.
    pub fn unhandled_report(&self) -> String {
        format!(
            "Unhandled error: {}\n{}",
            self.payload.repr(),
            self.call_stack.repr()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_payload() {
        let e = LispError::lisp_msg("boom");
        assert_eq!(format!("{}", e), "lisp_error: \"boom\"");
    }

    #[test]
    fn with_call_stack_only_attaches_once() {
        let e = LispError::eval_msg("x").with_call_stack(Value::sym("first"));
        let e = e.with_call_stack(Value::sym("second"));
        assert_eq!(e.call_stack.as_symbol(), Some("first"));
    }
}
