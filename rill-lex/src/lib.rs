//! Lexer for the `rill` scripting language.
//!
//! Converts source text into a flat stream of [`token::Token`]s. The lexer
//! recognizes no keywords: every bare word is a `Variable` token, and the
//! handful of reserved *commands* (`let`, `if`, `while`, ...) are resolved by
//! the evaluator, not here.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{NumberLit, OperatorKind, Token, TokenKind};
