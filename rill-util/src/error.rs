//! The interpreter's single fatal-error type.
//!
//! The language has exactly one error severity: any detected problem aborts
//! the whole run with a one-line diagnostic. [`Fatal`] is the Rust encoding of
//! that mechanism, threaded through the lexer, parser, and evaluator via `?`.

use thiserror::Error;

use crate::span::Span;

/// Every way the interpreter can abort.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Fatal {
    /// A statement's head named a command that doesn't exist.
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// A built-in statement was called with the wrong number of arguments.
    #[error("wrong arity for {command}: expected {expected}, got {got}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// An operator or command received a value of the wrong kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A variable was read before it was ever bound in any enclosing scope.
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },

    /// An `Access` (`.`) lookup named a key the scope does not contain.
    #[error("missing scope key: {key}")]
    MissingScopeKey { key: String },

    /// The lexer could not classify a byte it was asked to read.
    #[error("lex error: {0}")]
    Lex(String),

    /// The parser could not assemble a well-formed tree from the tokens.
    #[error("parse error: {0}")]
    Parse(String),

    /// A catch-all for conditions that don't fit a more specific category.
    #[error("{0}")]
    Message(String),
}

impl Fatal {
    pub fn message(text: impl Into<String>) -> Self {
        Fatal::Message(text.into())
    }

    /// The span, if any, where this error should be reported. The language's
    /// own diagnostics are one-liners with no source snippet (the user-facing
    /// text never includes a span), but callers building richer tooling (the
    /// `--dump-tokens`/`--dump-ast` debug paths) can attach one here.
    pub fn with_span(self, _span: Span) -> Self {
        self
    }
}

/// Result type alias used throughout the lexer, parser, and evaluator.
pub type Result<T> = std::result::Result<T, Fatal>;
